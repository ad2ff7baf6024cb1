//! Entity setup for a connected gateway

use std::sync::Arc;

use ha_components::climate::ClimateEntity;
use ha_components::switch::SwitchEntity;
use ha_components::{EntityComponent, HomeAssistantResult, SharedEntity};
use ha_registries::EntityRegistry;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::climate::{PlugwiseClimate, THERMOSTAT_CLASSES};
use crate::coordinator::PlugwiseCoordinator;
use crate::entity::spawn_listener;
use crate::migration::migrate_unique_ids;
use crate::switch::{PlugwiseSwitch, SWITCHES};
use crate::DOMAIN;

/// Entities created for one gateway
pub struct PlugwiseEntities {
    pub climates: Vec<SharedEntity<PlugwiseClimate>>,
    pub switches: Vec<SharedEntity<PlugwiseSwitch>>,
    /// Coordinator listeners, one per entity
    pub listeners: Vec<JoinHandle<()>>,
}

/// Set up the climate and switch entities of a connected gateway
///
/// Unique ids are migrated before any entity is added so migrated entities
/// keep their entity_id.
#[instrument(skip_all)]
pub async fn setup_entry(
    coordinator: Arc<PlugwiseCoordinator>,
    climate_component: &EntityComponent<dyn ClimateEntity>,
    switch_component: &EntityComponent<dyn SwitchEntity>,
    registry: &EntityRegistry,
) -> HomeAssistantResult<PlugwiseEntities> {
    migrate_unique_ids(registry)?;

    let data = coordinator.data();
    let mut dev_ids: Vec<&String> = data.devices.keys().collect();
    dev_ids.sort();

    let mut entities = PlugwiseEntities {
        climates: Vec::new(),
        switches: Vec::new(),
        listeners: Vec::new(),
    };

    for dev_id in dev_ids {
        let device = &data.devices[dev_id];

        if THERMOSTAT_CLASSES.contains(&device.dev_class.as_str()) {
            match PlugwiseClimate::new(Arc::clone(&coordinator), dev_id) {
                Some(climate) => {
                    let climate = Arc::new(Mutex::new(climate));
                    let shared: SharedEntity<dyn ClimateEntity> = climate.clone();
                    climate_component.add_entity(DOMAIN, shared).await?;
                    entities.climates.push(climate);
                }
                None => warn!(dev_id = %dev_id, "Thermostat without location, skipping"),
            }
        }

        for description in SWITCHES.iter() {
            if !device.switches.contains_key(description.key) {
                continue;
            }
            let switch = Arc::new(Mutex::new(PlugwiseSwitch::new(
                Arc::clone(&coordinator),
                dev_id,
                description.clone(),
            )));
            let shared: SharedEntity<dyn SwitchEntity> = switch.clone();
            switch_component.add_entity(DOMAIN, shared).await?;
            entities.switches.push(switch);
        }
    }

    for climate in &entities.climates {
        entities
            .listeners
            .push(spawn_listener(&coordinator, Arc::clone(climate)));
    }
    for switch in &entities.switches {
        entities
            .listeners
            .push(spawn_listener(&coordinator, Arc::clone(switch)));
    }

    info!(
        climates = entities.climates.len(),
        switches = entities.switches.len(),
        "Set up Plugwise entities"
    );
    Ok(entities)
}
