//! Switch domain

use async_trait::async_trait;
use ha_core::{ServiceCall, STATE_OFF, STATE_ON};
use tracing::{debug, instrument};

use crate::component::EntityComponent;
use crate::entity::Entity;
use crate::error::HomeAssistantResult;

pub const DOMAIN: &str = "switch";

pub const SERVICE_TURN_ON: &str = "turn_on";
pub const SERVICE_TURN_OFF: &str = "turn_off";
pub const SERVICE_TOGGLE: &str = "toggle";

/// Static description of a switch an integration can expose
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchEntityDescription {
    /// Key into the device data (e.g. `relay`)
    pub key: &'static str,
    pub name: &'static str,
    pub icon: Option<&'static str>,
}

/// An on/off entity
#[async_trait]
pub trait SwitchEntity: Entity {
    /// Whether the switch is on, None when unknown
    fn is_on(&self) -> Option<bool>;

    async fn turn_on(&mut self) -> HomeAssistantResult<()>;

    async fn turn_off(&mut self) -> HomeAssistantResult<()>;

    /// Turn off when on, on otherwise
    async fn toggle(&mut self) -> HomeAssistantResult<()> {
        if self.is_on() == Some(true) {
            self.turn_off().await
        } else {
            self.turn_on().await
        }
    }
}

/// State string of a switch
pub fn state<E: SwitchEntity + ?Sized>(entity: &E) -> Option<String> {
    entity.is_on().map(|on| {
        if on {
            STATE_ON.to_string()
        } else {
            STATE_OFF.to_string()
        }
    })
}

impl EntityComponent<dyn SwitchEntity> {
    /// Handle a `switch.*` service call
    #[instrument(skip(self, call), fields(service = %call.service))]
    pub async fn handle_service(&self, call: &ServiceCall) -> HomeAssistantResult<()> {
        debug!("Dispatching switch service");
        match call.service.as_str() {
            SERVICE_TURN_ON => self.for_each_target(call, 0, |entity| entity.turn_on()).await,
            SERVICE_TURN_OFF => self.for_each_target(call, 0, |entity| entity.turn_off()).await,
            SERVICE_TOGGLE => self.for_each_target(call, 0, |entity| entity.toggle()).await,
            _ => Err(self.service_not_found(call)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::SharedEntity;
    use crate::entity::EntityBase;
    use ha_core::Context;
    use ha_registries::EntityRegistry;
    use ha_state_machine::StateMachine;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    struct Relay {
        base: EntityBase,
        on: Option<bool>,
    }

    impl Entity for Relay {
        fn base(&self) -> &EntityBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut EntityBase {
            &mut self.base
        }
        fn state(&self) -> Option<String> {
            state(self)
        }
    }

    #[async_trait]
    impl SwitchEntity for Relay {
        fn is_on(&self) -> Option<bool> {
            self.on
        }
        async fn turn_on(&mut self) -> HomeAssistantResult<()> {
            self.on = Some(true);
            self.write_state();
            Ok(())
        }
        async fn turn_off(&mut self) -> HomeAssistantResult<()> {
            self.on = Some(false);
            self.write_state();
            Ok(())
        }
    }

    async fn setup(on: Option<bool>) -> EntityComponent<dyn SwitchEntity> {
        let component: EntityComponent<dyn SwitchEntity> = EntityComponent::new(
            DOMAIN,
            Arc::new(StateMachine::new()),
            Arc::new(EntityRegistry::new()),
        );
        let entity: SharedEntity<dyn SwitchEntity> = Arc::new(Mutex::new(Relay {
            base: EntityBase::new()
                .with_name("Router")
                .with_unique_id("675416a629f343c495449970e2ca37b5-relay"),
            on,
        }));
        component.add_entity("demo", entity).await.unwrap();
        component
    }

    fn toggle() -> ServiceCall {
        ServiceCall::new(
            DOMAIN,
            SERVICE_TOGGLE,
            json!({"entity_id": "switch.router"}),
            Context::new(),
        )
    }

    #[tokio::test]
    async fn test_toggle_flips_state() {
        let component = setup(Some(true)).await;
        assert!(component.states().is_state("switch.router", "on"));

        component.handle_service(&toggle()).await.unwrap();
        assert!(component.states().is_state("switch.router", "off"));

        component.handle_service(&toggle()).await.unwrap();
        assert!(component.states().is_state("switch.router", "on"));
    }

    #[tokio::test]
    async fn test_toggle_from_unknown_turns_on() {
        let component = setup(None).await;
        assert!(component.states().is_state("switch.router", "unknown"));

        component.handle_service(&toggle()).await.unwrap();
        assert!(component.states().is_state("switch.router", "on"));
    }

    #[tokio::test]
    async fn test_duplicate_unique_id_rejected() {
        let component = setup(Some(false)).await;
        let again: SharedEntity<dyn SwitchEntity> = Arc::new(Mutex::new(Relay {
            base: EntityBase::new()
                .with_name("Router")
                .with_unique_id("675416a629f343c495449970e2ca37b5-relay"),
            on: None,
        }));

        let err = component.add_entity("demo", again).await.unwrap_err();
        assert_eq!(
            err,
            crate::HomeAssistantError::DuplicateEntity("switch.router".to_string())
        );
        assert_eq!(component.entity_ids(), vec!["switch.router"]);
    }
}
