//! MQTT integration for Home Assistant
//!
//! The broker connection itself lives behind the [`MqttClient`] trait. This
//! crate provides what MQTT platforms share (messages, payload decoding,
//! value templates, availability and JSON attribute handling, topic
//! subscription glue) and the MQTT lock platform.

mod error;
mod mixins;
mod models;
mod payload;
mod subscription;
mod template;

pub mod lock;

pub use error::{MqttError, MqttResult};
pub use mixins::{MqttEntityConfig, MqttEntityMixin};
pub use models::{MqttClient, PublishMessage, Qos, ReceiveMessage};
pub use payload::{decode_payload, encode_payload, validate_encoding, Payload};
pub use subscription::{
    open_subscriptions, subscribe_topics, MqttEntity, PendingSubscriptions, SubscriptionKind,
    TopicSubscription,
};
pub use template::MqttValueTemplate;

/// Platform name MQTT entities are registered under
pub const PLATFORM: &str = "mqtt";
