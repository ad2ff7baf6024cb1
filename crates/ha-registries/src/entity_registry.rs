//! Entity Registry
//!
//! Tracks registered entities by entity_id and by their
//! `(domain, platform, unique_id)` key.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ha_core::{EntityId, EntityIdError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use ulid::Ulid;

/// Errors that can occur in the entity registry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityRegistryError {
    /// Entity was not found
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Another entity of the same platform already uses the unique_id
    #[error("Unique id '{unique_id}' is already in use by {existing}")]
    UniqueIdConflict { unique_id: String, existing: String },

    /// A generated entity_id was invalid
    #[error(transparent)]
    InvalidEntityId(#[from] EntityIdError),
}

/// Lookup key for platform entities
type UniqueKey = (String, String, String);

/// A registered entity entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityEntry {
    /// Internal ULID
    pub id: String,
    /// Full entity ID (domain.object_id)
    pub entity_id: EntityId,
    /// Platform-specific unique identifier
    pub unique_id: String,
    /// Previous unique_id (set by migrations)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_unique_id: Option<String>,
    /// Integration that provides this entity (e.g. "mqtt", "plugwise")
    pub platform: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,
}

impl EntityEntry {
    fn new(entity_id: EntityId, platform: &str, unique_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Ulid::new().to_string(),
            entity_id,
            unique_id: unique_id.to_string(),
            previous_unique_id: None,
            platform: platform.to_string(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Get domain from entity_id
    pub fn domain(&self) -> &str {
        self.entity_id.domain()
    }

    fn key(&self) -> UniqueKey {
        (
            self.domain().to_string(),
            self.platform.clone(),
            self.unique_id.clone(),
        )
    }
}

/// Entity Registry
///
/// Entries are shared as `Arc<EntityEntry>`; updates replace the Arc.
pub struct EntityRegistry {
    by_entity_id: DashMap<String, Arc<EntityEntry>>,
    by_unique_id: DashMap<UniqueKey, String>,
}

impl EntityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            by_entity_id: DashMap::new(),
            by_unique_id: DashMap::new(),
        }
    }

    /// Get entry by entity_id
    pub fn get(&self, entity_id: &str) -> Option<Arc<EntityEntry>> {
        self.by_entity_id.get(entity_id).map(|e| Arc::clone(&e))
    }

    /// Get the entity_id registered for a platform unique_id
    pub fn get_entity_id(&self, domain: &str, platform: &str, unique_id: &str) -> Option<EntityId> {
        let key = (domain.to_string(), platform.to_string(), unique_id.to_string());
        let entity_id = self.by_unique_id.get(&key)?.clone();
        self.get(&entity_id).map(|e| e.entity_id.clone())
    }

    /// Check if an entity_id is registered
    pub fn is_registered(&self, entity_id: &str) -> bool {
        self.by_entity_id.contains_key(entity_id)
    }

    /// Get or create an entity entry
    ///
    /// An existing entry for the `(domain, platform, unique_id)` triple is
    /// returned untouched. Otherwise a new entity_id is generated from
    /// `suggested_object_id`, skipping ids that are registered or reported
    /// by `is_reserved` (e.g. already present in the state machine).
    pub fn get_or_create(
        &self,
        domain: &str,
        platform: &str,
        unique_id: &str,
        suggested_object_id: &str,
        is_reserved: impl Fn(&str) -> bool,
    ) -> Result<Arc<EntityEntry>, EntityRegistryError> {
        if let Some(entity_id) = self.get_entity_id(domain, platform, unique_id) {
            if let Some(existing) = self.get(&entity_id.to_string()) {
                debug!("Found existing entity by unique_id: {}", existing.entity_id);
                return Ok(existing);
            }
        }

        let entity_id = EntityId::generate(domain, suggested_object_id, |candidate| {
            self.is_registered(candidate) || is_reserved(candidate)
        })?;

        let entry = Arc::new(EntityEntry::new(entity_id, platform, unique_id));
        self.index_entry(Arc::clone(&entry));

        info!("Registered new entity: {}", entry.entity_id);
        Ok(entry)
    }

    /// Change the unique_id of a registered entity
    ///
    /// Fails if another entity of the same domain and platform already uses
    /// `new_unique_id`.
    pub fn update_unique_id(
        &self,
        entity_id: &str,
        new_unique_id: &str,
    ) -> Result<Arc<EntityEntry>, EntityRegistryError> {
        let current = self
            .get(entity_id)
            .ok_or_else(|| EntityRegistryError::NotFound(entity_id.to_string()))?;

        let new_key = (
            current.domain().to_string(),
            current.platform.clone(),
            new_unique_id.to_string(),
        );
        if let Some(existing) = self.by_unique_id.get(&new_key) {
            if existing.as_str() != entity_id {
                return Err(EntityRegistryError::UniqueIdConflict {
                    unique_id: new_unique_id.to_string(),
                    existing: existing.clone(),
                });
            }
        }

        let mut entry = (*current).clone();
        self.by_unique_id.remove(&entry.key());
        entry.previous_unique_id = Some(std::mem::replace(
            &mut entry.unique_id,
            new_unique_id.to_string(),
        ));
        entry.modified_at = Utc::now();

        let entry = Arc::new(entry);
        self.index_entry(Arc::clone(&entry));
        Ok(entry)
    }

    /// Run a unique-id migration over all entries of a platform
    ///
    /// `migrate` returns the new unique_id for entries that need one.
    /// Returns the number of migrated entries.
    pub fn migrate_entries<F>(
        &self,
        platform: &str,
        migrate: F,
    ) -> Result<usize, EntityRegistryError>
    where
        F: Fn(&EntityEntry) -> Option<String>,
    {
        let candidates: Vec<Arc<EntityEntry>> = self
            .by_entity_id
            .iter()
            .filter(|e| e.platform == platform)
            .map(|e| Arc::clone(e.value()))
            .collect();

        let mut migrated = 0;
        for entry in candidates {
            if let Some(new_unique_id) = migrate(entry.as_ref()) {
                info!(
                    "Migrating unique_id from [{}] to [{}] for {}",
                    entry.unique_id, new_unique_id, entry.entity_id
                );
                self.update_unique_id(&entry.entity_id.to_string(), &new_unique_id)?;
                migrated += 1;
            }
        }
        Ok(migrated)
    }

    /// Register an entry with a fixed entity_id
    pub fn register(
        &self,
        entity_id: EntityId,
        platform: &str,
        unique_id: &str,
    ) -> Result<Arc<EntityEntry>, EntityRegistryError> {
        let key = (
            entity_id.domain().to_string(),
            platform.to_string(),
            unique_id.to_string(),
        );
        if let Some(existing) = self.by_unique_id.get(&key) {
            return Err(EntityRegistryError::UniqueIdConflict {
                unique_id: unique_id.to_string(),
                existing: existing.clone(),
            });
        }
        let entry = Arc::new(EntityEntry::new(entity_id, platform, unique_id));
        self.index_entry(Arc::clone(&entry));
        Ok(entry)
    }

    /// Number of registered entities
    pub fn len(&self) -> usize {
        self.by_entity_id.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.by_entity_id.is_empty()
    }

    fn index_entry(&self, entry: Arc<EntityEntry>) {
        let entity_id = entry.entity_id.to_string();
        self.by_unique_id.insert(entry.key(), entity_id.clone());
        self.by_entity_id.insert(entity_id, entry);
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
