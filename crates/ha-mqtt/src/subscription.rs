//! Topic subscription glue between the client and entities

use std::sync::Arc;

use ha_components::{Entity, SharedEntity};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, trace};

use crate::error::MqttResult;
use crate::models::{MqttClient, Qos, ReceiveMessage};

/// What a subscribed topic carries for the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    State,
    Availability,
    JsonAttributes,
}

/// A topic an entity wants messages from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSubscription {
    pub topic: String,
    pub qos: Qos,
    pub kind: SubscriptionKind,
}

/// An entity fed by MQTT messages
pub trait MqttEntity: Entity {
    fn client(&self) -> Arc<dyn MqttClient>;

    /// Topics to subscribe, including availability and attribute topics
    fn subscriptions(&self) -> Vec<TopicSubscription>;

    /// Handle a message received on a subscription of `kind`
    fn message_received(&mut self, kind: SubscriptionKind, message: &ReceiveMessage);
}

/// Topics subscribed at the client whose messages are not forwarded yet
///
/// Dropping it closes every subscription it holds.
pub struct PendingSubscriptions {
    receivers: Vec<(TopicSubscription, mpsc::Receiver<ReceiveMessage>)>,
}

impl PendingSubscriptions {
    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    /// Spawn one task per topic forwarding messages to `entity` until the
    /// client closes the subscription
    pub fn forward<E>(self, entity: SharedEntity<E>) -> Vec<JoinHandle<()>>
    where
        E: MqttEntity + ?Sized + 'static,
    {
        self.receivers
            .into_iter()
            .map(|(subscription, mut messages)| {
                let entity = Arc::clone(&entity);
                tokio::spawn(async move {
                    while let Some(message) = messages.recv().await {
                        trace!(
                            topic = %message.topic,
                            bytes = message.payload.len(),
                            "Message received"
                        );
                        entity.lock().await.message_received(subscription.kind, &message);
                    }
                    debug!(topic = %subscription.topic, "Subscription closed");
                })
            })
            .collect()
    }
}

/// Subscribe every topic of `entity` without forwarding anything yet
///
/// Fails on the first topic the client rejects; the topics subscribed
/// before it are closed again.
#[instrument(skip(entity))]
pub async fn open_subscriptions<E>(entity: &SharedEntity<E>) -> MqttResult<PendingSubscriptions>
where
    E: MqttEntity + ?Sized + 'static,
{
    let (client, subscriptions) = {
        let guard = entity.lock().await;
        (guard.client(), guard.subscriptions())
    };

    let mut receivers = Vec::with_capacity(subscriptions.len());
    for subscription in subscriptions {
        let messages = client.subscribe(&subscription.topic, subscription.qos).await?;
        debug!(topic = %subscription.topic, kind = ?subscription.kind, "Subscribed");
        receivers.push((subscription, messages));
    }
    Ok(PendingSubscriptions { receivers })
}

/// Subscribe all topics of `entity` and forward their messages
///
/// Nothing is forwarded unless every topic was subscribed.
pub async fn subscribe_topics<E>(entity: SharedEntity<E>) -> MqttResult<Vec<JoinHandle<()>>>
where
    E: MqttEntity + ?Sized + 'static,
{
    let pending = open_subscriptions(&entity).await?;
    Ok(pending.forward(entity))
}
