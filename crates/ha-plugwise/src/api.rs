//! Client seam to the Smile gateway

use async_trait::async_trait;

use crate::data::GatewayData;
use crate::error::GatewayError;

/// Operations the integration needs from a Smile client
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Fetch a full snapshot of gateway and device data
    async fn async_update(&self) -> Result<GatewayData, GatewayError>;

    /// Set the thermostat setpoint of a location
    async fn set_temperature(&self, loc_id: &str, temperature: f64) -> Result<(), GatewayError>;

    /// Turn the schedule `last_used` of a location on (`"true"`) or off (`"false"`)
    async fn set_schedule_state(
        &self,
        loc_id: &str,
        last_used: Option<String>,
        state: &str,
    ) -> Result<(), GatewayError>;

    /// Activate a preset of a location
    async fn set_preset(&self, loc_id: &str, preset: &str) -> Result<(), GatewayError>;

    /// Switch an appliance (or group, given its `members`) `"on"` or `"off"`
    async fn set_switch_state(
        &self,
        appliance: &str,
        members: Option<Vec<String>>,
        model: &str,
        state: &str,
    ) -> Result<(), GatewayError>;
}
