//! State type representing an entity's current state

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Context, EntityId, MAX_STATE_LENGTH, STATE_UNAVAILABLE, STATE_UNKNOWN};

/// Attribute map attached to a state
pub type Attributes = HashMap<String, serde_json::Value>;

/// Represents the state of an entity at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    /// The entity this state belongs to
    pub entity_id: EntityId,

    /// The state value (e.g., "locked", "on", "heat", "unavailable")
    pub state: String,

    /// Additional attributes associated with the state
    #[serde(default)]
    pub attributes: Attributes,

    /// When the state was last changed (different from previous state)
    pub last_changed: DateTime<Utc>,

    /// When the state was last updated (even if value didn't change)
    pub last_updated: DateTime<Utc>,

    /// Context of the change that created this state
    pub context: Context,
}

impl State {
    /// Create a new state with current timestamp
    ///
    /// State values longer than [`MAX_STATE_LENGTH`] are replaced by
    /// `"unknown"`.
    pub fn new(
        entity_id: EntityId,
        state: impl Into<String>,
        attributes: Attributes,
        context: Context,
    ) -> Self {
        let now = Utc::now();
        Self {
            entity_id,
            state: clamp_state(state.into()),
            attributes,
            last_changed: now,
            last_updated: now,
            context,
        }
    }

    /// Create an updated state, preserving last_changed if state value is the same
    pub fn with_update(
        &self,
        new_state: impl Into<String>,
        new_attributes: Attributes,
        context: Context,
    ) -> Self {
        let now = Utc::now();
        let new_state = clamp_state(new_state.into());
        let state_changed = self.state != new_state;

        Self {
            entity_id: self.entity_id.clone(),
            state: new_state,
            attributes: new_attributes,
            last_changed: if state_changed {
                now
            } else {
                self.last_changed
            },
            last_updated: now,
            context,
        }
    }

    /// Check if the state value represents an unavailable entity
    pub fn is_unavailable(&self) -> bool {
        self.state == STATE_UNAVAILABLE
    }

    /// Check if the state value represents an unknown state
    pub fn is_unknown(&self) -> bool {
        self.state == STATE_UNKNOWN
    }

    /// Get an attribute value by key
    pub fn attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

fn clamp_state(state: String) -> String {
    if state.len() > MAX_STATE_LENGTH {
        STATE_UNKNOWN.to_string()
    } else {
        state
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        // Timestamps and context are not compared
        self.entity_id == other.entity_id
            && self.state == other.state
            && self.attributes == other.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity_id() -> EntityId {
        EntityId::new("lock", "front_door").unwrap()
    }

    #[test]
    fn test_with_update_keeps_last_changed_for_same_value() {
        let first = State::new(entity_id(), "locked", Attributes::new(), Context::new());
        let second = first.with_update("locked", Attributes::new(), Context::new());
        assert_eq!(first.last_changed, second.last_changed);

        let third = second.with_update("unlocked", Attributes::new(), Context::new());
        assert!(third.last_changed >= second.last_changed);
        assert_eq!(third.state, "unlocked");
    }

    #[test]
    fn test_overlong_state_becomes_unknown() {
        let state = State::new(
            entity_id(),
            "x".repeat(MAX_STATE_LENGTH + 1),
            Attributes::new(),
            Context::new(),
        );
        assert!(state.is_unknown());
    }

    #[test]
    fn test_typed_attribute_access() {
        let attrs = Attributes::from([("supported_features".to_string(), json!(1))]);
        let state = State::new(entity_id(), "locked", attrs, Context::new());
        assert_eq!(state.attribute::<u32>("supported_features"), Some(1));
        assert_eq!(state.attribute::<u32>("missing"), None);
    }
}
