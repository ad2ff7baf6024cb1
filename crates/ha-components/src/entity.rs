//! Base entity contract
//!
//! Every platform entity embeds an [`EntityBase`] and implements [`Entity`].
//! Domain traits ([`crate::lock::LockEntity`], ...) build on top of it and the
//! entity writes its state through [`Entity::write_state`] whenever it changes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ha_core::{
    attributes, Attributes, Context, EntityId, State, STATE_UNAVAILABLE, STATE_UNKNOWN,
};
use ha_state_machine::StateMachine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, trace};

/// Device an entity belongs to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// `(integration, id)` pairs identifying the device
    #[serde(default)]
    pub identifiers: Vec<(String, String)>,
    /// `(connection type, value)` pairs such as `("mac", "01:23:...")`
    #[serde(default)]
    pub connections: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hw_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_url: Option<String>,
    /// Parent device (e.g. the gateway for a zigbee thermostat)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via_device: Option<(String, String)>,
}

/// How long a service call's context is reused for the entity's state writes
pub const CONTEXT_RECENT_TIME: Duration = Duration::from_secs(5);

/// Set once the entity has been added to an [`crate::EntityComponent`]
#[derive(Clone)]
struct Attachment {
    entity_id: EntityId,
    states: Arc<StateMachine>,
}

/// Common entity properties and the handle into the state machine
#[derive(Clone, Default)]
pub struct EntityBase {
    /// Platform unique id, used by the entity registry
    pub unique_id: Option<String>,
    /// Display name, also used to suggest the entity_id
    pub name: Option<String>,
    /// Icon such as `mdi:electric-switch`
    pub icon: Option<String>,
    /// Device the entity belongs to
    pub device_info: Option<DeviceInfo>,
    attachment: Option<Attachment>,
    context: Option<(Context, Instant)>,
}

impl EntityBase {
    /// Create an empty base
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the unique id
    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the icon
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set the device info
    pub fn with_device_info(mut self, device_info: DeviceInfo) -> Self {
        self.device_info = Some(device_info);
        self
    }

    /// The entity_id, once added
    pub fn entity_id(&self) -> Option<&EntityId> {
        self.attachment.as_ref().map(|a| &a.entity_id)
    }

    /// Whether the entity has been added to a component
    pub fn is_added(&self) -> bool {
        self.attachment.is_some()
    }

    pub(crate) fn attach(&mut self, entity_id: EntityId, states: Arc<StateMachine>) {
        self.attachment = Some(Attachment { entity_id, states });
    }

    /// Context used for state writes in the next [`CONTEXT_RECENT_TIME`]
    ///
    /// Set by the component before a service handler runs so the resulting
    /// state change is attributed to the caller. Later writes get a fresh
    /// context.
    pub fn set_context(&mut self, context: Context) {
        self.context = Some((context, Instant::now()));
    }

    fn recent_context(&self) -> Option<&Context> {
        self.context
            .as_ref()
            .filter(|(_, set_at)| set_at.elapsed() < CONTEXT_RECENT_TIME)
            .map(|(context, _)| context)
    }

    /// Write a state into the state machine
    ///
    /// Returns None (and writes nothing) before the entity is added.
    pub fn write(&self, state: &str, attributes: Attributes) -> Option<State> {
        let Some(attachment) = &self.attachment else {
            trace!(state, "Entity not added yet, skipping state write");
            return None;
        };
        let context = self.recent_context().cloned().unwrap_or_default();
        Some(
            attachment
                .states
                .set(attachment.entity_id.clone(), state, attributes, context),
        )
    }
}

impl std::fmt::Debug for EntityBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityBase")
            .field("entity_id", &self.entity_id())
            .field("unique_id", &self.unique_id)
            .field("name", &self.name)
            .field("icon", &self.icon)
            .finish()
    }
}

/// Common entity contract
///
/// `state`, `capability_attributes` and `state_attributes` are normally
/// implemented by delegating to the domain module helpers (e.g.
/// [`crate::lock::state`]).
pub trait Entity: Send + Sync {
    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    /// The state string, None for unknown
    fn state(&self) -> Option<String>;

    /// Attributes describing what the entity can do
    fn capability_attributes(&self) -> Attributes {
        Attributes::new()
    }

    /// Domain attributes describing the current state
    fn state_attributes(&self) -> Attributes {
        Attributes::new()
    }

    /// Integration specific attributes
    fn extra_state_attributes(&self) -> Attributes {
        Attributes::new()
    }

    fn available(&self) -> bool {
        true
    }

    /// True when the integration cannot read back the real device state
    fn assumed_state(&self) -> bool {
        false
    }

    /// Domain feature bitmask
    fn supported_features(&self) -> u32 {
        0
    }

    /// Called once the entity has an entity_id, right before its first
    /// state write
    fn added_to_platform(&mut self) {}

    /// Write the current state into the state machine
    fn write_state(&self) -> Option<State> {
        write_entity_state(self)
    }
}

/// Assemble the full state of an entity and write it
///
/// Capability attributes are always written. State and extra attributes only
/// when the entity is available; an unavailable entity reports
/// `"unavailable"` regardless of its state.
pub fn write_entity_state<E: Entity + ?Sized>(entity: &E) -> Option<State> {
    let base = entity.base();
    let available = entity.available();

    let state = if available {
        entity.state().unwrap_or_else(|| STATE_UNKNOWN.to_string())
    } else {
        STATE_UNAVAILABLE.to_string()
    };

    let mut attrs = entity.capability_attributes();
    if available {
        attrs.extend(entity.state_attributes());
        attrs.extend(entity.extra_state_attributes());
    }

    if let Some(name) = &base.name {
        attrs.insert(attributes::FRIENDLY_NAME.to_string(), json!(name));
    }
    if let Some(icon) = &base.icon {
        attrs.insert(attributes::ICON.to_string(), json!(icon));
    }
    let features = entity.supported_features();
    if features != 0 {
        attrs.insert(attributes::SUPPORTED_FEATURES.to_string(), json!(features));
    }
    if entity.assumed_state() {
        attrs.insert(attributes::ASSUMED_STATE.to_string(), json!(true));
    }

    if let Some(entity_id) = base.entity_id() {
        debug!(entity_id = %entity_id, state = %state, "Writing entity state");
    }
    base.write(&state, attrs)
}
