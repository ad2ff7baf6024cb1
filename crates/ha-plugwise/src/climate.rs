//! Plugwise thermostats

use std::sync::Arc;

use async_trait::async_trait;
use ha_components::climate::{
    self, ClimateEntity, ClimateEntityFeature, HvacAction, HvacMode, SetTemperatureRequest,
    TemperatureUnit,
};
use ha_components::{Entity, EntityBase, HomeAssistantError, HomeAssistantResult};
use ha_core::Attributes;
use serde_json::json;
use tracing::debug;

use crate::coordinator::PlugwiseCoordinator;
use crate::entity::{CoordinatorEntity, PlugwiseEntity};
use crate::util::run_command;
use crate::{DEFAULT_MAX_TEMP, DEFAULT_MIN_TEMP, SCHEDULE_OFF, SCHEDULE_ON};

pub const HVAC_MODES_HEAT_ONLY: [HvacMode; 3] = [HvacMode::Heat, HvacMode::Auto, HvacMode::Off];
pub const HVAC_MODES_HEAT_COOL: [HvacMode; 4] =
    [HvacMode::Heat, HvacMode::Cool, HvacMode::Auto, HvacMode::Off];

/// Device classes exposed as climate entities
pub const THERMOSTAT_CLASSES: [&str; 3] =
    ["thermostat", "zone_thermostat", "thermostatic_radiator_valve"];

/// A thermostat of a Plugwise location
pub struct PlugwiseClimate {
    entity: PlugwiseEntity,
    loc_id: String,
    hvac_mode: HvacMode,
    hvac_modes: Vec<HvacMode>,
    hvac_action: Option<HvacAction>,
    target_temperature: Option<f64>,
    current_temperature: Option<f64>,
    preset_mode: Option<String>,
    preset_modes: Option<Vec<String>>,
    extra_attributes: Attributes,
}

impl PlugwiseClimate {
    /// Returns None when the device is unknown or has no location
    pub fn new(coordinator: Arc<PlugwiseCoordinator>, dev_id: &str) -> Option<Self> {
        let mut entity = PlugwiseEntity::new(coordinator, dev_id);
        let device = entity.device()?;
        let loc_id = device.location.clone()?;
        let name = device.name.clone();

        let base = entity.base_mut();
        base.unique_id = Some(format!("{}-climate", dev_id));
        base.name = name;

        Some(Self {
            entity,
            loc_id,
            hvac_mode: HvacMode::Heat,
            hvac_modes: HVAC_MODES_HEAT_ONLY.to_vec(),
            hvac_action: None,
            target_temperature: None,
            current_temperature: None,
            preset_mode: None,
            preset_modes: None,
            extra_attributes: Attributes::new(),
        })
    }

    pub fn loc_id(&self) -> &str {
        &self.loc_id
    }

    /// Derive every attribute from the synced snapshot
    fn update_from_data(&mut self) {
        self.entity.sync();
        let snapshot = self.entity.snapshot().clone();
        let Some(device) = snapshot.data.device(self.entity.dev_id()) else {
            debug!(dev_id = %self.entity.dev_id(), "Device missing from gateway data");
            return;
        };

        if let Some(setpoint) = device.sensors.setpoint {
            self.target_temperature = Some(setpoint);
        }
        if let Some(temperature) = device.sensors.temperature {
            self.current_temperature = Some(temperature);
        }

        self.preset_mode = device.active_preset.clone();
        if device.presets.is_empty() {
            self.preset_mode = None;
        } else {
            let mut presets: Vec<String> = device.presets.keys().cloned().collect();
            presets.sort();
            self.preset_modes = Some(presets);
        }

        let heater = snapshot.data.heater();
        self.hvac_action = Some(match heater {
            Some(heater) if heater.heating_state == Some(true) => HvacAction::Heating,
            Some(heater) if heater.cooling_state == Some(true) => HvacAction::Cooling,
            _ => HvacAction::Idle,
        });

        self.hvac_modes = if snapshot.data.gateway.cooling_present {
            HVAC_MODES_HEAT_COOL.to_vec()
        } else {
            HVAC_MODES_HEAT_ONLY.to_vec()
        };
        if let Some(mode) = device.mode.as_deref().and_then(|m| m.parse::<HvacMode>().ok()) {
            if self.hvac_modes.contains(&mode) {
                self.hvac_mode = mode;
            }
        }

        self.extra_attributes = Attributes::from([
            ("available_schemas".to_string(), json!(device.available_schedules)),
            ("selected_schema".to_string(), json!(device.selected_schedule)),
        ]);
    }
}

impl Entity for PlugwiseClimate {
    fn base(&self) -> &EntityBase {
        self.entity.base()
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        self.entity.base_mut()
    }

    fn state(&self) -> Option<String> {
        climate::state(self)
    }

    fn capability_attributes(&self) -> Attributes {
        climate::capability_attributes(self)
    }

    fn state_attributes(&self) -> Attributes {
        climate::state_attributes(self)
    }

    fn extra_state_attributes(&self) -> Attributes {
        self.extra_attributes.clone()
    }

    fn available(&self) -> bool {
        self.entity.available()
    }

    fn supported_features(&self) -> u32 {
        ClimateEntityFeature::TARGET_TEMPERATURE | ClimateEntityFeature::PRESET_MODE
    }

    fn added_to_platform(&mut self) {
        self.update_from_data();
    }
}

impl CoordinatorEntity for PlugwiseClimate {
    fn handle_coordinator_update(&mut self) {
        self.update_from_data();
        self.write_state();
    }
}

#[async_trait]
impl ClimateEntity for PlugwiseClimate {
    fn hvac_mode(&self) -> Option<HvacMode> {
        Some(self.hvac_mode)
    }

    fn hvac_modes(&self) -> Vec<HvacMode> {
        self.hvac_modes.clone()
    }

    fn hvac_action(&self) -> Option<HvacAction> {
        self.hvac_action
    }

    fn temperature_unit(&self) -> TemperatureUnit {
        TemperatureUnit::Celsius
    }

    fn current_temperature(&self) -> Option<f64> {
        self.current_temperature
    }

    fn target_temperature(&self) -> Option<f64> {
        self.target_temperature
    }

    fn min_temp(&self) -> f64 {
        DEFAULT_MIN_TEMP
    }

    fn max_temp(&self) -> f64 {
        DEFAULT_MAX_TEMP
    }

    fn preset_mode(&self) -> Option<String> {
        self.preset_mode.clone()
    }

    fn preset_modes(&self) -> Option<Vec<String>> {
        self.preset_modes.clone()
    }

    async fn set_temperature(&mut self, request: SetTemperatureRequest) -> HomeAssistantResult<()> {
        let coordinator = Arc::clone(self.entity.coordinator());
        let api = coordinator.api();
        let (min, max) = (self.min_temp(), self.max_temp());
        let loc_id = self.loc_id.clone();

        run_command(&coordinator, async move {
            let temperature = request
                .temperature
                .filter(|t| (min..=max).contains(t))
                .ok_or_else(|| {
                    HomeAssistantError::InvalidValue("Invalid temperature requested".to_string())
                })?;
            api.set_temperature(&loc_id, temperature).await?;
            Ok::<(), HomeAssistantError>(())
        })
        .await
    }

    async fn set_hvac_mode(&mut self, hvac_mode: HvacMode) -> HomeAssistantResult<()> {
        let coordinator = Arc::clone(self.entity.coordinator());
        let api = coordinator.api();
        let loc_id = self.loc_id.clone();
        let device = self.entity.device().cloned().unwrap_or_default();

        run_command(&coordinator, async {
            let mut state = SCHEDULE_OFF;
            if hvac_mode == HvacMode::Auto {
                state = SCHEDULE_ON;
                if let Some(temperature) = device.schedule_temperature {
                    api.set_temperature(&loc_id, temperature).await?;
                    self.target_temperature = Some(temperature);
                }
            }
            api.set_schedule_state(&loc_id, device.last_used.clone(), state)
                .await?;
            Ok::<(), HomeAssistantError>(())
        })
        .await
    }

    async fn set_preset_mode(&mut self, preset_mode: String) -> HomeAssistantResult<()> {
        let coordinator = Arc::clone(self.entity.coordinator());
        let api = coordinator.api();
        let loc_id = self.loc_id.clone();
        let has_presets = self
            .entity
            .device()
            .map(|device| !device.presets.is_empty())
            .unwrap_or(false);

        run_command(&coordinator, async move {
            if !has_presets {
                return Err(HomeAssistantError::InvalidValue(
                    "No presets available".to_string(),
                ));
            }
            api.set_preset(&loc_id, &preset_mode).await?;
            Ok::<(), HomeAssistantError>(())
        })
        .await
    }
}
