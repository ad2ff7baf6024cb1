//! Gateway data model
//!
//! Mirrors the JSON snapshot the Smile client returns. Unknown keys are
//! ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Full snapshot returned by [`crate::GatewayApi::async_update`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayData {
    pub gateway: GatewayInfo,
    #[serde(default)]
    pub devices: HashMap<String, DeviceData>,
}

impl GatewayData {
    pub fn device(&self, dev_id: &str) -> Option<&DeviceData> {
        self.devices.get(dev_id)
    }

    /// The central heater (boiler / heat pump), if the gateway has one
    pub fn heater(&self) -> Option<&DeviceData> {
        self.gateway
            .heater_id
            .as_deref()
            .and_then(|id| self.devices.get(id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayInfo {
    pub gateway_id: String,
    pub heater_id: Option<String>,
    pub smile_name: String,
    pub cooling_present: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sensors {
    #[serde(default)]
    pub setpoint: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(flatten)]
    pub other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceData {
    pub name: Option<String>,
    #[serde(rename = "class")]
    pub dev_class: String,
    pub location: Option<String>,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub firmware: Option<String>,
    pub hardware: Option<String>,
    pub mac_address: Option<String>,
    pub zigbee_mac_address: Option<String>,
    pub available: Option<bool>,
    /// Member appliances of a switch group
    pub members: Option<Vec<String>>,
    pub sensors: Sensors,
    pub switches: HashMap<String, bool>,
    pub heating_state: Option<bool>,
    pub cooling_state: Option<bool>,
    /// Preset name to `[heating, cooling]` setpoints
    pub presets: HashMap<String, [f64; 2]>,
    pub active_preset: Option<String>,
    pub available_schedules: Option<Vec<String>>,
    pub selected_schedule: Option<String>,
    pub last_used: Option<String>,
    pub schedule_temperature: Option<f64>,
    pub mode: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_snapshot() {
        let data: GatewayData = serde_json::from_value(json!({
            "gateway": {
                "gateway_id": "gw",
                "heater_id": "boiler",
                "smile_name": "Adam",
                "unknown_key": 1
            },
            "devices": {
                "boiler": {"class": "heater_central", "heating_state": true},
                "zone": {
                    "class": "zone_thermostat",
                    "name": "Zone Lisa WK",
                    "location": "loc",
                    "sensors": {"setpoint": 21.5, "temperature": 20.9, "battery": 34},
                    "presets": {"home": [20.0, 22.0]},
                    "mode": "auto"
                }
            }
        }))
        .unwrap();

        assert!(!data.gateway.cooling_present);
        assert_eq!(data.heater().unwrap().heating_state, Some(true));
        let zone = data.device("zone").unwrap();
        assert_eq!(zone.dev_class, "zone_thermostat");
        assert_eq!(zone.sensors.setpoint, Some(21.5));
        assert_eq!(zone.sensors.other["battery"], json!(34));
        assert_eq!(zone.presets["home"], [20.0, 22.0]);
        assert!(zone.switches.is_empty());
    }
}
