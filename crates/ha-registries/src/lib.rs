//! Home Assistant Registries
//!
//! This crate provides the entity registry, which remembers the entity_id
//! handed out for every `(domain, platform, unique_id)` triple so entities
//! keep their ids across restarts and unique-id migrations.

pub mod entity_registry;

pub use entity_registry::{EntityEntry, EntityRegistry, EntityRegistryError};
