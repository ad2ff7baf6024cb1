//! MQTT lock platform
//!
//! Publishes lock commands to a command topic and, when a state topic is
//! configured, follows the state the device reports. Without a state topic
//! the lock runs in optimistic mode and assumes every command succeeded.

use std::sync::Arc;

use async_trait::async_trait;
use ha_components::lock::{self, LockEntity, LockEntityFeature, ATTR_CHANGED_BY, ATTR_CODE_FORMAT};
use ha_components::{
    Entity, EntityBase, EntityComponent, HomeAssistantError, HomeAssistantResult, SharedEntity,
};
use ha_core::Attributes;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::{MqttError, MqttResult};
use crate::mixins::{MqttEntityConfig, MqttEntityMixin};
use crate::models::{MqttClient, PublishMessage, ReceiveMessage};
use crate::payload::{decode_payload, encode_payload};
use crate::subscription::{open_subscriptions, MqttEntity, SubscriptionKind, TopicSubscription};
use crate::template::MqttValueTemplate;
use crate::PLATFORM;

/// Attributes a JSON attributes payload may not override
pub const BLOCKED_ATTRIBUTES: &[&str] = &[ATTR_CHANGED_BY, ATTR_CODE_FORMAT];

fn default_name() -> String {
    "MQTT Lock".to_string()
}

fn default_payload_lock() -> String {
    "LOCK".to_string()
}

fn default_payload_unlock() -> String {
    "UNLOCK".to_string()
}

fn default_state_locked() -> String {
    "LOCKED".to_string()
}

fn default_state_unlocked() -> String {
    "UNLOCKED".to_string()
}

/// Configuration of an MQTT lock
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MqttLockConfig {
    #[serde(flatten)]
    pub entity: MqttEntityConfig,
    #[serde(default = "default_name")]
    pub name: String,
    pub command_topic: String,
    #[serde(default)]
    pub state_topic: Option<String>,
    #[serde(default)]
    pub optimistic: bool,
    #[serde(default = "default_payload_lock")]
    pub payload_lock: String,
    #[serde(default = "default_payload_unlock")]
    pub payload_unlock: String,
    /// Enables the `open` service when set
    #[serde(default)]
    pub payload_open: Option<String>,
    #[serde(default = "default_state_locked")]
    pub state_locked: String,
    #[serde(default = "default_state_unlocked")]
    pub state_unlocked: String,
    #[serde(default)]
    pub value_template: Option<String>,
}

impl MqttLockConfig {
    /// Parse a YAML configuration block
    pub fn from_yaml(yaml: &str) -> MqttResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON configuration, as sent in discovery payloads
    pub fn from_value(value: serde_json::Value) -> MqttResult<Self> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the options serde cannot
    ///
    /// QoS is range checked while deserializing.
    pub fn validate(&self) -> MqttResult<()> {
        if self.command_topic.trim().is_empty() {
            return Err(MqttError::Config("command_topic must not be empty".to_string()));
        }
        self.entity.validate()
    }
}

/// A lock controlled over MQTT
pub struct MqttLock {
    base: EntityBase,
    config: MqttLockConfig,
    client: Arc<dyn MqttClient>,
    mixin: MqttEntityMixin,
    value_template: MqttValueTemplate,
    optimistic: bool,
    locked: bool,
}

impl std::fmt::Debug for MqttLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttLock")
            .field("config", &self.config)
            .field("optimistic", &self.optimistic)
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}

impl MqttLock {
    pub fn new(config: MqttLockConfig, client: Arc<dyn MqttClient>) -> MqttResult<Self> {
        let mixin = MqttEntityMixin::new(config.entity.clone(), BLOCKED_ATTRIBUTES)?;
        let value_template = MqttValueTemplate::new(config.value_template.as_deref())?;

        let mut base = EntityBase::new().with_name(config.name.clone());
        if let Some(unique_id) = &config.entity.unique_id {
            base = base.with_unique_id(unique_id.clone());
        }
        if let Some(icon) = &config.entity.icon {
            base = base.with_icon(icon.clone());
        }

        Ok(Self {
            base,
            optimistic: config.optimistic || config.state_topic.is_none(),
            config,
            client,
            mixin,
            value_template,
            locked: false,
        })
    }

    pub fn config(&self) -> &MqttLockConfig {
        &self.config
    }

    /// Whether commands update the state without device feedback
    pub fn is_optimistic(&self) -> bool {
        self.optimistic
    }

    fn state_received(&mut self, payload: &str) {
        let value = self.value_template.render_with_possible_json_value(payload);
        if value == self.config.state_locked {
            self.locked = true;
        } else if value == self.config.state_unlocked {
            self.locked = false;
        } else {
            debug!(payload = %value, "Payload matches neither locked nor unlocked state");
        }
        self.write_state();
    }

    async fn publish(&self, payload: &str) -> HomeAssistantResult<()> {
        let entity = &self.config.entity;
        let message = PublishMessage {
            topic: self.config.command_topic.clone(),
            payload: encode_payload(payload, &entity.encoding),
            qos: entity.qos,
            retain: entity.retain,
        };
        debug!(topic = %message.topic, payload, qos = %message.qos, "Publishing lock command");
        self.client.publish(message).await?;
        Ok(())
    }

    async fn command(&mut self, payload: String, locked: bool) -> HomeAssistantResult<()> {
        self.publish(&payload).await?;
        if self.optimistic {
            self.locked = locked;
            self.write_state();
        }
        Ok(())
    }
}

impl Entity for MqttLock {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn state(&self) -> Option<String> {
        lock::state(self)
    }

    fn extra_state_attributes(&self) -> Attributes {
        self.mixin.attributes().clone()
    }

    fn available(&self) -> bool {
        self.mixin.available()
    }

    fn assumed_state(&self) -> bool {
        self.optimistic
    }

    fn supported_features(&self) -> u32 {
        if self.config.payload_open.is_some() {
            LockEntityFeature::OPEN
        } else {
            0
        }
    }
}

#[async_trait]
impl LockEntity for MqttLock {
    fn is_locked(&self) -> Option<bool> {
        Some(self.locked)
    }

    async fn lock(&mut self) -> HomeAssistantResult<()> {
        let payload = self.config.payload_lock.clone();
        self.command(payload, true).await
    }

    async fn unlock(&mut self) -> HomeAssistantResult<()> {
        let payload = self.config.payload_unlock.clone();
        self.command(payload, false).await
    }

    async fn open(&mut self) -> HomeAssistantResult<()> {
        let Some(payload) = self.config.payload_open.clone() else {
            return Err(HomeAssistantError::not_supported(
                self.base.entity_id(),
                lock::SERVICE_OPEN,
            ));
        };
        self.command(payload, false).await
    }
}

impl MqttEntity for MqttLock {
    fn client(&self) -> Arc<dyn MqttClient> {
        Arc::clone(&self.client)
    }

    fn subscriptions(&self) -> Vec<TopicSubscription> {
        let mut subscriptions = self.mixin.subscriptions();
        if let Some(topic) = &self.config.state_topic {
            subscriptions.push(TopicSubscription {
                topic: topic.clone(),
                qos: self.config.entity.qos,
                kind: SubscriptionKind::State,
            });
        }
        subscriptions
    }

    fn message_received(&mut self, kind: SubscriptionKind, message: &ReceiveMessage) {
        let Some(payload) = decode_payload(&message.payload, &self.config.entity.encoding) else {
            return;
        };
        let payload = payload.to_text();
        match kind {
            SubscriptionKind::State => self.state_received(&payload),
            SubscriptionKind::Availability => {
                if self.mixin.availability_received(&payload) {
                    self.write_state();
                }
            }
            SubscriptionKind::JsonAttributes => {
                if self.mixin.attributes_received(&payload) {
                    self.write_state();
                }
            }
        }
    }
}

/// Create an MQTT lock, subscribe its topics and add it to `component`
///
/// Returns the lock together with the tasks forwarding its messages. On
/// error nothing is left behind: the lock is not added and no subscription
/// stays open.
#[instrument(skip_all, fields(name = %config.name))]
pub async fn setup_platform(
    config: MqttLockConfig,
    client: Arc<dyn MqttClient>,
    component: &EntityComponent<dyn LockEntity>,
) -> HomeAssistantResult<(SharedEntity<MqttLock>, Vec<JoinHandle<()>>)> {
    if let Err(e) = config.validate() {
        warn!(error = %e, "Invalid MQTT lock configuration");
        return Err(e.into());
    }

    let entity = Arc::new(Mutex::new(MqttLock::new(config, client)?));
    let pending = open_subscriptions(&entity).await?;

    let shared: SharedEntity<dyn LockEntity> = entity.clone();
    let entity_id = component.add_entity(PLATFORM, shared).await?;

    let tasks = pending.forward(Arc::clone(&entity));
    info!(entity_id = %entity_id, subscriptions = tasks.len(), "Set up MQTT lock");
    Ok((entity, tasks))
}
