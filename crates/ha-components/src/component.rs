//! Per-domain entity container
//!
//! An [`EntityComponent`] owns the entities of one domain. It gives each
//! entity its entity_id (through the entity registry when the entity has a
//! unique id), performs the first state write and routes service calls to
//! the targeted entities. The service tables live in the domain modules as
//! `impl EntityComponent<dyn DomainTrait>` blocks.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{try_join_all, BoxFuture};
use ha_core::{EntityId, ServiceCall};
use ha_registries::EntityRegistry;
use ha_state_machine::StateMachine;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::entity::Entity;
use crate::error::{HomeAssistantError, HomeAssistantResult};

/// An entity shared between its component and the integration feeding it
pub type SharedEntity<E> = Arc<Mutex<E>>;

/// Container for all entities of one domain
pub struct EntityComponent<E: ?Sized> {
    domain: &'static str,
    states: Arc<StateMachine>,
    registry: Arc<EntityRegistry>,
    entities: DashMap<String, SharedEntity<E>>,
}

impl<E: ?Sized + Entity> EntityComponent<E> {
    /// Create an empty component for `domain`
    pub fn new(
        domain: &'static str,
        states: Arc<StateMachine>,
        registry: Arc<EntityRegistry>,
    ) -> Self {
        Self {
            domain,
            states,
            registry,
            entities: DashMap::new(),
        }
    }

    /// The domain this component serves
    pub fn domain(&self) -> &'static str {
        self.domain
    }

    /// The state machine entities write into
    pub fn states(&self) -> &Arc<StateMachine> {
        &self.states
    }

    /// Add an entity provided by `platform`
    ///
    /// Entities with a unique id keep the entity_id recorded in the registry;
    /// others get one generated from their name. The entity's first state is
    /// written before this returns.
    #[instrument(skip(self, entity), fields(domain = self.domain))]
    pub async fn add_entity(
        &self,
        platform: &str,
        entity: SharedEntity<E>,
    ) -> HomeAssistantResult<EntityId> {
        let mut guard = entity.lock().await;

        let base = guard.base();
        let suggestion = base
            .name
            .clone()
            .or_else(|| base.unique_id.clone())
            .unwrap_or_default();

        let entity_id = match base.unique_id.clone() {
            Some(unique_id) => self
                .registry
                .get_or_create(self.domain, platform, &unique_id, &suggestion, |candidate| {
                    self.states.contains(candidate) || self.entities.contains_key(candidate)
                })?
                .entity_id
                .clone(),
            None => EntityId::generate(self.domain, &suggestion, |candidate| {
                self.states.contains(candidate)
                    || self.entities.contains_key(candidate)
                    || self.registry.is_registered(candidate)
            })?,
        };

        let key = entity_id.to_string();
        if self.entities.contains_key(&key) {
            return Err(HomeAssistantError::DuplicateEntity(key));
        }

        guard.base_mut().attach(entity_id.clone(), self.states.clone());
        guard.added_to_platform();
        guard.write_state();
        drop(guard);

        self.entities.insert(key, entity);
        info!(entity_id = %entity_id, platform, "Added entity");
        Ok(entity_id)
    }

    /// Get an entity by entity_id
    pub fn get(&self, entity_id: &str) -> Option<SharedEntity<E>> {
        self.entities.get(entity_id).map(|e| Arc::clone(&e))
    }

    /// All entity_ids of this component, sorted
    pub fn entity_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entities.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the component has no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Run `handler` on every entity targeted by `call`
    ///
    /// Targets are handled concurrently and the first error is returned.
    /// Unknown entity_ids are skipped. When `required_feature` is non-zero an
    /// entity lacking it fails with [`HomeAssistantError::NotSupported`].
    pub(crate) async fn for_each_target<F>(
        &self,
        call: &ServiceCall,
        required_feature: u32,
        handler: F,
    ) -> HomeAssistantResult<()>
    where
        F: for<'a> Fn(&'a mut E) -> BoxFuture<'a, HomeAssistantResult<()>> + Sync,
    {
        let targets: Vec<SharedEntity<E>> = call
            .entity_ids()
            .iter()
            .filter_map(|id| {
                let entity = self.get(&id.to_string());
                if entity.is_none() {
                    debug!(entity_id = %id, "Skipping unknown service target");
                }
                entity
            })
            .collect();

        let handler = &handler;
        try_join_all(targets.into_iter().map(|entity| async move {
            let mut guard = entity.lock().await;
            if required_feature != 0 && guard.supported_features() & required_feature == 0 {
                return Err(HomeAssistantError::not_supported(
                    guard.base().entity_id(),
                    &call.service,
                ));
            }
            guard.base_mut().set_context(call.context.clone());
            handler(&mut *guard).await
        }))
        .await?;

        Ok(())
    }

    pub(crate) fn service_not_found(&self, call: &ServiceCall) -> HomeAssistantError {
        HomeAssistantError::ServiceNotFound {
            domain: self.domain.to_string(),
            service: call.service.clone(),
        }
    }
}
