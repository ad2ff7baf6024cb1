//! Error types for the MQTT integration

use ha_components::HomeAssistantError;
use thiserror::Error;

/// Result type for MQTT operations
pub type MqttResult<T> = Result<T, MqttError>;

/// Errors raised by the MQTT client seam and platform configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MqttError {
    /// The client failed to publish
    #[error("failed to publish to '{topic}': {message}")]
    Publish { topic: String, message: String },

    /// The client failed to subscribe
    #[error("failed to subscribe to '{topic}': {message}")]
    Subscribe { topic: String, message: String },

    /// Invalid platform configuration
    #[error("invalid MQTT configuration: {0}")]
    Config(String),

    /// QoS outside 0..=2
    #[error("invalid QoS level {0}")]
    InvalidQos(u8),

    /// Payload encoding that cannot be decoded
    #[error("unsupported payload encoding '{0}'")]
    Encoding(String),
}

impl From<serde_json::Error> for MqttError {
    fn from(err: serde_json::Error) -> Self {
        MqttError::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for MqttError {
    fn from(err: serde_yaml::Error) -> Self {
        MqttError::Config(err.to_string())
    }
}

impl From<MqttError> for HomeAssistantError {
    fn from(err: MqttError) -> Self {
        match err {
            MqttError::Publish { .. } | MqttError::Subscribe { .. } => {
                HomeAssistantError::Integration(err.to_string())
            }
            MqttError::Config(_) | MqttError::InvalidQos(_) | MqttError::Encoding(_) => {
                HomeAssistantError::InvalidValue(err.to_string())
            }
        }
    }
}
