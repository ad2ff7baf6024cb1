//! Plugwise Smile integration for Home Assistant
//!
//! A [`PlugwiseCoordinator`] polls the gateway through the [`GatewayApi`]
//! seam and holds the latest [`GatewayData`]. Climate and switch entities
//! derive their state from that snapshot and send commands back through the
//! API, after which the coordinator is refreshed.

mod api;
mod config;
mod coordinator;
mod data;
mod entity;
mod error;
mod migration;
mod setup;
mod util;

pub mod climate;
pub mod switch;

pub use api::GatewayApi;
pub use config::PlugwiseConfig;
pub use coordinator::{CoordinatorState, PlugwiseCoordinator};
pub use data::{DeviceData, GatewayData, GatewayInfo, Sensors};
pub use entity::{spawn_listener, CoordinatorEntity, PlugwiseEntity};
pub use error::GatewayError;
pub use migration::migrate_unique_ids;
pub use setup::{setup_entry, PlugwiseEntities};
pub use util::run_command;

/// Integration (and entity platform) name
pub const DOMAIN: &str = "plugwise";

/// Thermostat setpoint bounds in °C
pub const DEFAULT_MIN_TEMP: f64 = 4.0;
pub const DEFAULT_MAX_TEMP: f64 = 30.0;

/// Schedule states understood by `set_schedule_state`
pub const SCHEDULE_ON: &str = "true";
pub const SCHEDULE_OFF: &str = "false";

pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_USERNAME: &str = "smile";
