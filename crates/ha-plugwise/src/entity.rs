//! Base of all Plugwise entities

use std::sync::Arc;

use ha_components::{DeviceInfo, Entity, EntityBase, SharedEntity};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::coordinator::{CoordinatorState, PlugwiseCoordinator};
use crate::data::DeviceData;
use crate::DOMAIN;

/// Device bound part shared by Plugwise entities
///
/// Keeps the coordinator snapshot the entity last synced with, so state
/// getters read the data that was current at the last coordinator update.
pub struct PlugwiseEntity {
    coordinator: Arc<PlugwiseCoordinator>,
    dev_id: String,
    snapshot: CoordinatorState,
    base: EntityBase,
}

impl PlugwiseEntity {
    pub fn new(coordinator: Arc<PlugwiseCoordinator>, dev_id: impl Into<String>) -> Self {
        let dev_id = dev_id.into();
        let snapshot = coordinator.snapshot();
        let base =
            EntityBase::new().with_device_info(device_info(&coordinator, &snapshot, &dev_id));
        Self {
            coordinator,
            dev_id,
            snapshot,
            base,
        }
    }

    pub fn coordinator(&self) -> &Arc<PlugwiseCoordinator> {
        &self.coordinator
    }

    pub fn dev_id(&self) -> &str {
        &self.dev_id
    }

    pub fn base(&self) -> &EntityBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    /// Data of this entity's device in the synced snapshot
    pub fn device(&self) -> Option<&DeviceData> {
        self.snapshot.data.device(&self.dev_id)
    }

    /// The synced snapshot
    pub fn snapshot(&self) -> &CoordinatorState {
        &self.snapshot
    }

    /// Take over the coordinator's latest snapshot
    pub fn sync(&mut self) {
        self.snapshot = self.coordinator.snapshot();
    }

    /// Present in the data, not flagged unavailable, and the last refresh
    /// succeeded
    pub fn available(&self) -> bool {
        self.snapshot.last_update_success
            && self
                .device()
                .map(|device| device.available.unwrap_or(true))
                .unwrap_or(false)
    }
}

fn device_info(
    coordinator: &PlugwiseCoordinator,
    snapshot: &CoordinatorState,
    dev_id: &str,
) -> DeviceInfo {
    let gateway = &snapshot.data.gateway;
    let device = snapshot.data.device(dev_id).cloned().unwrap_or_default();

    let mut connections = Vec::new();
    if let Some(mac) = device.mac_address {
        connections.push(("mac".to_string(), mac));
    }
    if let Some(mac) = device.zigbee_mac_address {
        connections.push(("zigbee".to_string(), mac));
    }

    let mut info = DeviceInfo {
        identifiers: vec![(DOMAIN.to_string(), dev_id.to_string())],
        connections,
        name: Some(format!("Smile {}", gateway.smile_name)),
        manufacturer: device.vendor,
        model: device.model,
        sw_version: device.firmware,
        hw_version: device.hardware,
        configuration_url: coordinator.config().map(|c| c.configuration_url()),
        via_device: None,
    };

    if dev_id != gateway.gateway_id {
        info.name = device.name;
        info.via_device = Some((DOMAIN.to_string(), gateway.gateway_id.clone()));
    }
    info
}

/// An entity that follows coordinator updates
pub trait CoordinatorEntity: Entity {
    /// Re-derive the state from the coordinator and write it
    fn handle_coordinator_update(&mut self);
}

/// Run `handle_coordinator_update` on `entity` after every refresh
pub fn spawn_listener<E>(
    coordinator: &PlugwiseCoordinator,
    entity: SharedEntity<E>,
) -> JoinHandle<()>
where
    E: CoordinatorEntity + ?Sized + 'static,
{
    let mut updates = coordinator.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let mut guard = entity.lock().await;
            trace!(entity_id = ?guard.base().entity_id(), "Coordinator update");
            guard.handle_coordinator_update();
        }
        debug!("Coordinator dropped, listener stopped");
    })
}
