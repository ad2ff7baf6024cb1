//! Lock domain
//!
//! A lock reports `locked`/`unlocked` and offers the `lock`, `unlock` and
//! (when [`LockEntityFeature::OPEN`] is supported) `open` services.

use async_trait::async_trait;
use ha_core::{ServiceCall, STATE_LOCKED, STATE_UNLOCKED};
use tracing::{debug, instrument};

use crate::component::EntityComponent;
use crate::entity::Entity;
use crate::error::{HomeAssistantError, HomeAssistantResult};

pub const DOMAIN: &str = "lock";

pub const SERVICE_LOCK: &str = "lock";
pub const SERVICE_UNLOCK: &str = "unlock";
pub const SERVICE_OPEN: &str = "open";

/// Attributes a lock may report
pub const ATTR_CHANGED_BY: &str = "changed_by";
pub const ATTR_CODE_FORMAT: &str = "code_format";

/// Lock feature flags
pub struct LockEntityFeature;

impl LockEntityFeature {
    /// The lock can open the door latch
    pub const OPEN: u32 = 1;
}

/// A lockable entity
#[async_trait]
pub trait LockEntity: Entity {
    /// Whether the lock is locked, None when unknown
    fn is_locked(&self) -> Option<bool>;

    async fn lock(&mut self) -> HomeAssistantResult<()>;

    async fn unlock(&mut self) -> HomeAssistantResult<()>;

    /// Open the door latch
    async fn open(&mut self) -> HomeAssistantResult<()> {
        Err(HomeAssistantError::not_supported(
            self.base().entity_id(),
            SERVICE_OPEN,
        ))
    }
}

/// State string of a lock
pub fn state<E: LockEntity + ?Sized>(entity: &E) -> Option<String> {
    entity.is_locked().map(|locked| {
        if locked {
            STATE_LOCKED.to_string()
        } else {
            STATE_UNLOCKED.to_string()
        }
    })
}

impl EntityComponent<dyn LockEntity> {
    /// Handle a `lock.*` service call
    #[instrument(skip(self, call), fields(service = %call.service))]
    pub async fn handle_service(&self, call: &ServiceCall) -> HomeAssistantResult<()> {
        debug!("Dispatching lock service");
        match call.service.as_str() {
            SERVICE_LOCK => self.for_each_target(call, 0, |entity| entity.lock()).await,
            SERVICE_UNLOCK => self.for_each_target(call, 0, |entity| entity.unlock()).await,
            SERVICE_OPEN => {
                self.for_each_target(call, LockEntityFeature::OPEN, |entity| entity.open())
                    .await
            }
            _ => Err(self.service_not_found(call)),
        }
    }
}
