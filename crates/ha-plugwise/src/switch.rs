//! Plugwise relays

use std::sync::Arc;

use async_trait::async_trait;
use ha_components::switch::{self, SwitchEntity, SwitchEntityDescription};
use ha_components::{Entity, EntityBase, HomeAssistantError, HomeAssistantResult};

use crate::coordinator::PlugwiseCoordinator;
use crate::entity::{CoordinatorEntity, PlugwiseEntity};
use crate::util::run_command;

pub const SWITCHES: [SwitchEntityDescription; 1] = [SwitchEntityDescription {
    key: "relay",
    name: "Relay",
    icon: Some("mdi:electric-switch"),
}];

/// A switchable output of a Plugwise device
pub struct PlugwiseSwitch {
    entity: PlugwiseEntity,
    description: SwitchEntityDescription,
}

impl PlugwiseSwitch {
    pub fn new(
        coordinator: Arc<PlugwiseCoordinator>,
        dev_id: &str,
        description: SwitchEntityDescription,
    ) -> Self {
        let mut entity = PlugwiseEntity::new(coordinator, dev_id);
        let device_name = entity
            .device()
            .and_then(|device| device.name.clone())
            .unwrap_or_default();

        let base = entity.base_mut();
        base.unique_id = Some(format!("{}-{}", dev_id, description.key));
        base.name = Some(
            format!("{} {}", device_name, description.name)
                .trim_start()
                .to_string(),
        );
        base.icon = description.icon.map(String::from);

        Self {
            entity,
            description,
        }
    }

    pub fn description(&self) -> &SwitchEntityDescription {
        &self.description
    }

    async fn set_state(&self, state: &str) -> HomeAssistantResult<()> {
        let coordinator = Arc::clone(self.entity.coordinator());
        let api = coordinator.api();
        let members = self.entity.device().and_then(|device| device.members.clone());

        run_command(&coordinator, async {
            api.set_switch_state(self.entity.dev_id(), members, self.description.key, state)
                .await?;
            Ok::<(), HomeAssistantError>(())
        })
        .await
    }
}

impl Entity for PlugwiseSwitch {
    fn base(&self) -> &EntityBase {
        self.entity.base()
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        self.entity.base_mut()
    }

    fn state(&self) -> Option<String> {
        switch::state(self)
    }

    fn available(&self) -> bool {
        self.entity.available()
    }

    fn added_to_platform(&mut self) {
        self.entity.sync();
    }
}

impl CoordinatorEntity for PlugwiseSwitch {
    fn handle_coordinator_update(&mut self) {
        self.entity.sync();
        self.write_state();
    }
}

#[async_trait]
impl SwitchEntity for PlugwiseSwitch {
    fn is_on(&self) -> Option<bool> {
        self.entity
            .device()
            .and_then(|device| device.switches.get(self.description.key).copied())
    }

    async fn turn_on(&mut self) -> HomeAssistantResult<()> {
        self.set_state("on").await
    }

    async fn turn_off(&mut self) -> HomeAssistantResult<()> {
        self.set_state("off").await
    }
}
