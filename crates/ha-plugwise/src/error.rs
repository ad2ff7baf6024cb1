//! Gateway errors

use ha_components::HomeAssistantError;
use thiserror::Error;

/// Failure reported by the Smile client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("invalid authentication")]
    InvalidAuthentication,

    #[error("invalid response: {0}")]
    ResponseError(String),

    #[error("unsupported gateway: {0}")]
    Unsupported(String),
}

impl From<GatewayError> for HomeAssistantError {
    fn from(err: GatewayError) -> Self {
        HomeAssistantError::Integration(format!("Error communicating with API: {}", err))
    }
}
