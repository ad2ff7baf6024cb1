//! Errors surfaced to service callers

use ha_core::EntityIdError;
use ha_registries::EntityRegistryError;
use thiserror::Error;

/// Result type for entity operations
pub type HomeAssistantResult<T> = Result<T, HomeAssistantError>;

/// Errors raised by entity services and entity setup
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HomeAssistantError {
    /// The integration failed to talk to its device or broker
    #[error("{0}")]
    Integration(String),

    /// The requested value was rejected by the entity
    #[error("{0}")]
    InvalidValue(String),

    /// The entity does not support the requested service
    #[error("Entity {entity_id} does not support service {service}")]
    NotSupported { entity_id: String, service: String },

    /// No such service in the domain
    #[error("Service {domain}.{service} not found")]
    ServiceNotFound { domain: String, service: String },

    /// The service data could not be parsed
    #[error("Invalid service data: {0}")]
    InvalidServiceData(String),

    /// An entity with the same entity_id was already added
    #[error("Entity {0} already exists")]
    DuplicateEntity(String),

    #[error(transparent)]
    Registry(#[from] EntityRegistryError),

    #[error(transparent)]
    InvalidEntityId(#[from] EntityIdError),
}

impl HomeAssistantError {
    /// Build a [`HomeAssistantError::NotSupported`] for an entity
    pub fn not_supported(entity_id: Option<&ha_core::EntityId>, service: &str) -> Self {
        Self::NotSupported {
            entity_id: entity_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "<not added>".to_string()),
            service: service.to_string(),
        }
    }
}
