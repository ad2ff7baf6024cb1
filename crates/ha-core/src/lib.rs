//! Core types for Home Assistant entities
//!
//! This crate provides the fundamental types shared by the entity platform
//! and the integrations built on it: EntityId, State, Context and ServiceCall.

mod context;
mod entity_id;
mod service_call;
mod state;

pub use context::Context;
pub use entity_id::{slugify, EntityId, EntityIdError};
pub use service_call::ServiceCall;
pub use state::{Attributes, State};

/// Maximum length for a state value (matches Python HA)
pub const MAX_STATE_LENGTH: usize = 255;

/// State value for an entity whose state is not known
pub const STATE_UNKNOWN: &str = "unknown";

/// State value for an entity that cannot currently be reached
pub const STATE_UNAVAILABLE: &str = "unavailable";

/// Toggle entity states
pub const STATE_ON: &str = "on";
pub const STATE_OFF: &str = "off";

/// Lock entity states
pub const STATE_LOCKED: &str = "locked";
pub const STATE_UNLOCKED: &str = "unlocked";

/// Well-known attribute keys written by the entity platform
pub mod attributes {
    pub const FRIENDLY_NAME: &str = "friendly_name";
    pub const ICON: &str = "icon";
    pub const SUPPORTED_FEATURES: &str = "supported_features";
    pub const ASSUMED_STATE: &str = "assumed_state";
    pub const ENTITY_ID: &str = "entity_id";
}

/// Standard event payloads
pub mod events {
    use super::*;

    /// Event type for state changes
    pub const STATE_CHANGED: &str = "state_changed";

    /// Data for STATE_CHANGED events
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    pub struct StateChangedData {
        pub entity_id: EntityId,
        pub old_state: Option<State>,
        pub new_state: Option<State>,
    }
}
