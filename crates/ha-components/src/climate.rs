//! Climate domain
//!
//! The state of a climate entity is its HVAC mode. Capability attributes
//! (`hvac_modes`, `min_temp`, ...) and state attributes
//! (`current_temperature`, `hvac_action`, ...) are derived from the
//! [`ClimateEntity`] getters.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use ha_core::{Attributes, ServiceCall};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use crate::component::EntityComponent;
use crate::entity::Entity;
use crate::error::{HomeAssistantError, HomeAssistantResult};

pub const DOMAIN: &str = "climate";

pub const SERVICE_SET_TEMPERATURE: &str = "set_temperature";
pub const SERVICE_SET_HVAC_MODE: &str = "set_hvac_mode";
pub const SERVICE_SET_PRESET_MODE: &str = "set_preset_mode";

pub const ATTR_HVAC_MODES: &str = "hvac_modes";
pub const ATTR_HVAC_ACTION: &str = "hvac_action";
pub const ATTR_MIN_TEMP: &str = "min_temp";
pub const ATTR_MAX_TEMP: &str = "max_temp";
pub const ATTR_PRESET_MODE: &str = "preset_mode";
pub const ATTR_PRESET_MODES: &str = "preset_modes";
pub const ATTR_CURRENT_TEMPERATURE: &str = "current_temperature";
pub const ATTR_TEMPERATURE: &str = "temperature";

/// Default temperature bounds in °C
pub const DEFAULT_MIN_TEMP: f64 = 7.0;
pub const DEFAULT_MAX_TEMP: f64 = 35.0;

/// Climate feature flags
pub struct ClimateEntityFeature;

impl ClimateEntityFeature {
    pub const TARGET_TEMPERATURE: u32 = 1;
    pub const PRESET_MODE: u32 = 16;
}

/// Operating mode of an HVAC device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacMode {
    Off,
    Heat,
    Cool,
    HeatCool,
    Auto,
    Dry,
    FanOnly,
}

impl HvacMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Heat => "heat",
            Self::Cool => "cool",
            Self::HeatCool => "heat_cool",
            Self::Auto => "auto",
            Self::Dry => "dry",
            Self::FanOnly => "fan_only",
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HvacMode {
    type Err = HomeAssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "heat" => Ok(Self::Heat),
            "cool" => Ok(Self::Cool),
            "heat_cool" => Ok(Self::HeatCool),
            "auto" => Ok(Self::Auto),
            "dry" => Ok(Self::Dry),
            "fan_only" => Ok(Self::FanOnly),
            other => Err(HomeAssistantError::InvalidServiceData(format!(
                "unknown hvac mode '{}'",
                other
            ))),
        }
    }
}

/// What the HVAC device is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HvacAction {
    Off,
    Heating,
    Cooling,
    Drying,
    Idle,
    Fan,
}

/// Unit temperatures are reported in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "°C")]
    Celsius,
    #[serde(rename = "°F")]
    Fahrenheit,
}

/// Data of a `climate.set_temperature` call
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SetTemperatureRequest {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub hvac_mode: Option<HvacMode>,
}

#[derive(Debug, Deserialize)]
struct SetHvacModeRequest {
    hvac_mode: HvacMode,
}

#[derive(Debug, Deserialize)]
struct SetPresetModeRequest {
    preset_mode: String,
}

/// A thermostat-like entity
#[async_trait]
pub trait ClimateEntity: Entity {
    fn hvac_mode(&self) -> Option<HvacMode>;

    fn hvac_modes(&self) -> Vec<HvacMode>;

    fn hvac_action(&self) -> Option<HvacAction> {
        None
    }

    fn temperature_unit(&self) -> TemperatureUnit;

    fn current_temperature(&self) -> Option<f64> {
        None
    }

    fn target_temperature(&self) -> Option<f64> {
        None
    }

    fn min_temp(&self) -> f64 {
        DEFAULT_MIN_TEMP
    }

    fn max_temp(&self) -> f64 {
        DEFAULT_MAX_TEMP
    }

    fn preset_mode(&self) -> Option<String> {
        None
    }

    fn preset_modes(&self) -> Option<Vec<String>> {
        None
    }

    async fn set_temperature(
        &mut self,
        request: SetTemperatureRequest,
    ) -> HomeAssistantResult<()>;

    async fn set_hvac_mode(&mut self, hvac_mode: HvacMode) -> HomeAssistantResult<()>;

    async fn set_preset_mode(&mut self, preset_mode: String) -> HomeAssistantResult<()> {
        let _ = preset_mode;
        Err(HomeAssistantError::not_supported(
            self.base().entity_id(),
            SERVICE_SET_PRESET_MODE,
        ))
    }
}

/// Round to the tenths the frontend displays
fn show_temp(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// State string of a climate entity
pub fn state<E: ClimateEntity + ?Sized>(entity: &E) -> Option<String> {
    entity.hvac_mode().map(|mode| mode.to_string())
}

/// `hvac_modes`, `min_temp`, `max_temp` and, with presets, `preset_modes`
pub fn capability_attributes<E: ClimateEntity + ?Sized>(entity: &E) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert(ATTR_HVAC_MODES.to_string(), json!(entity.hvac_modes()));
    attrs.insert(ATTR_MIN_TEMP.to_string(), json!(show_temp(entity.min_temp())));
    attrs.insert(ATTR_MAX_TEMP.to_string(), json!(show_temp(entity.max_temp())));
    if entity.supported_features() & ClimateEntityFeature::PRESET_MODE != 0 {
        attrs.insert(ATTR_PRESET_MODES.to_string(), json!(entity.preset_modes()));
    }
    attrs
}

/// Temperatures, current action and preset
pub fn state_attributes<E: ClimateEntity + ?Sized>(entity: &E) -> Attributes {
    let features = entity.supported_features();
    let mut attrs = Attributes::new();
    attrs.insert(
        ATTR_CURRENT_TEMPERATURE.to_string(),
        json!(entity.current_temperature().map(show_temp)),
    );
    if features & ClimateEntityFeature::TARGET_TEMPERATURE != 0 {
        attrs.insert(
            ATTR_TEMPERATURE.to_string(),
            json!(entity.target_temperature().map(show_temp)),
        );
    }
    if let Some(action) = entity.hvac_action() {
        attrs.insert(ATTR_HVAC_ACTION.to_string(), json!(action));
    }
    if features & ClimateEntityFeature::PRESET_MODE != 0 {
        attrs.insert(ATTR_PRESET_MODE.to_string(), json!(entity.preset_mode()));
    }
    attrs
}

fn parse_data<T: serde::de::DeserializeOwned>(call: &ServiceCall) -> HomeAssistantResult<T> {
    call.data()
        .map_err(|e| HomeAssistantError::InvalidServiceData(e.to_string()))
}

impl EntityComponent<dyn ClimateEntity> {
    /// Handle a `climate.*` service call
    ///
    /// `set_temperature` with an `hvac_mode` switches the mode first.
    #[instrument(skip(self, call), fields(service = %call.service))]
    pub async fn handle_service(&self, call: &ServiceCall) -> HomeAssistantResult<()> {
        debug!("Dispatching climate service");
        match call.service.as_str() {
            SERVICE_SET_TEMPERATURE => {
                let request: SetTemperatureRequest = parse_data(call)?;
                self.for_each_target(call, ClimateEntityFeature::TARGET_TEMPERATURE, |entity| {
                    let request = request.clone();
                    Box::pin(async move {
                        if let Some(mode) = request.hvac_mode {
                            entity.set_hvac_mode(mode).await?;
                        }
                        entity.set_temperature(request).await
                    })
                })
                .await
            }
            SERVICE_SET_HVAC_MODE => {
                let request: SetHvacModeRequest = parse_data(call)?;
                self.for_each_target(call, 0, |entity| entity.set_hvac_mode(request.hvac_mode))
                    .await
            }
            SERVICE_SET_PRESET_MODE => {
                let request: SetPresetModeRequest = parse_data(call)?;
                self.for_each_target(call, ClimateEntityFeature::PRESET_MODE, |entity| {
                    entity.set_preset_mode(request.preset_mode.clone())
                })
                .await
            }
            _ => Err(self.service_not_found(call)),
        }
    }
}
