//! Configuration and behaviour shared by MQTT entities

use ha_core::Attributes;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::MqttResult;
use crate::models::Qos;
use crate::payload::validate_encoding;
use crate::subscription::{SubscriptionKind, TopicSubscription};
use crate::template::MqttValueTemplate;

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_payload_available() -> String {
    "online".to_string()
}

fn default_payload_not_available() -> String {
    "offline".to_string()
}

/// Options every MQTT entity accepts
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MqttEntityConfig {
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub qos: Qos,
    #[serde(default)]
    pub retain: bool,
    /// Payload encoding; empty for raw bytes
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default)]
    pub availability_topic: Option<String>,
    #[serde(default = "default_payload_available")]
    pub payload_available: String,
    #[serde(default = "default_payload_not_available")]
    pub payload_not_available: String,
    #[serde(default)]
    pub json_attributes_topic: Option<String>,
    #[serde(default)]
    pub json_attributes_template: Option<String>,
}

impl Default for MqttEntityConfig {
    fn default() -> Self {
        Self {
            unique_id: None,
            icon: None,
            qos: Qos::default(),
            retain: false,
            encoding: default_encoding(),
            availability_topic: None,
            payload_available: default_payload_available(),
            payload_not_available: default_payload_not_available(),
            json_attributes_topic: None,
            json_attributes_template: None,
        }
    }
}

impl MqttEntityConfig {
    /// Check the options serde cannot
    pub fn validate(&self) -> MqttResult<()> {
        validate_encoding(&self.encoding)
    }
}

/// Availability and JSON attribute tracking for an MQTT entity
#[derive(Debug)]
pub struct MqttEntityMixin {
    config: MqttEntityConfig,
    available: bool,
    attributes: Attributes,
    attributes_template: MqttValueTemplate,
    blocked_attributes: &'static [&'static str],
}

impl MqttEntityMixin {
    /// `blocked_attributes` are keys a JSON attributes payload may not set
    pub fn new(
        config: MqttEntityConfig,
        blocked_attributes: &'static [&'static str],
    ) -> MqttResult<Self> {
        let attributes_template =
            MqttValueTemplate::new(config.json_attributes_template.as_deref())?;
        Ok(Self {
            available: config.availability_topic.is_none(),
            config,
            attributes: Attributes::new(),
            attributes_template,
            blocked_attributes,
        })
    }

    pub fn config(&self) -> &MqttEntityConfig {
        &self.config
    }

    /// Whether the entity is available
    ///
    /// Always true without an availability topic.
    pub fn available(&self) -> bool {
        self.available
    }

    /// Attributes received on the JSON attributes topic
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Availability and JSON attribute subscriptions
    pub fn subscriptions(&self) -> Vec<TopicSubscription> {
        let mut subscriptions = Vec::new();
        if let Some(topic) = &self.config.availability_topic {
            subscriptions.push(TopicSubscription {
                topic: topic.clone(),
                qos: self.config.qos,
                kind: SubscriptionKind::Availability,
            });
        }
        if let Some(topic) = &self.config.json_attributes_topic {
            subscriptions.push(TopicSubscription {
                topic: topic.clone(),
                qos: self.config.qos,
                kind: SubscriptionKind::JsonAttributes,
            });
        }
        subscriptions
    }

    /// Handle an availability payload, returns true when availability changed
    pub fn availability_received(&mut self, payload: &str) -> bool {
        let available = if payload == self.config.payload_available {
            true
        } else if payload == self.config.payload_not_available {
            false
        } else {
            debug!(payload, "Ignoring unknown availability payload");
            return false;
        };
        let changed = self.available != available;
        self.available = available;
        changed
    }

    /// Handle a JSON attributes payload, returns true when attributes were replaced
    pub fn attributes_received(&mut self, payload: &str) -> bool {
        let rendered = self.attributes_template.render_with_possible_json_value(payload);
        match serde_json::from_str::<serde_json::Value>(&rendered) {
            Ok(serde_json::Value::Object(map)) => {
                self.attributes = map
                    .into_iter()
                    .filter(|(key, _)| !self.blocked_attributes.contains(&key.as_str()))
                    .collect();
                true
            }
            Ok(_) => {
                warn!(payload = %rendered, "JSON result was not a dictionary");
                false
            }
            Err(e) => {
                warn!(payload = %rendered, error = %e, "Erroneous JSON");
                false
            }
        }
    }
}
