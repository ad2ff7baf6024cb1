//! Home Assistant Entity Platform
//!
//! This crate contains the pieces integrations build their entities on:
//!
//! - [`Entity`] and [`EntityBase`]: common entity properties and the state
//!   write path into the state machine
//! - [`lock`], [`switch`] and [`climate`]: domain traits, their state
//!   derivation and their services
//! - [`EntityComponent`]: per-domain entity container that assigns entity ids
//!   and dispatches service calls

mod component;
mod entity;
mod error;

pub mod climate;
pub mod lock;
pub mod switch;

pub use component::{EntityComponent, SharedEntity};
pub use entity::{write_entity_state, DeviceInfo, Entity, EntityBase, CONTEXT_RECENT_TIME};
pub use error::{HomeAssistantError, HomeAssistantResult};
