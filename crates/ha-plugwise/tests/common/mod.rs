//! Shared test harness: a recording gateway and a wired-up integration

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ha_components::climate::{self, ClimateEntity};
use ha_components::switch::{self, SwitchEntity};
use ha_components::EntityComponent;
use ha_core::{Context, ServiceCall, State};
use ha_plugwise::{
    setup_entry, GatewayApi, GatewayData, GatewayError, PlugwiseConfig, PlugwiseCoordinator,
    PlugwiseEntities,
};
use ha_registries::EntityRegistry;
use ha_state_machine::StateMachine;
use serde_json::Value;

pub const ADAM: &str = include_str!("../fixtures/adam.json");
pub const STRETCH: &str = include_str!("../fixtures/stretch.json");

/// A command the integration sent to the gateway
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetTemperature(String, f64),
    SetScheduleState(String, Option<String>, String),
    SetPreset(String, String),
    SetSwitchState(String, Option<Vec<String>>, String, String),
}

pub fn switch_call(dev_id: &str, state: &str) -> Call {
    Call::SetSwitchState(dev_id.to_string(), None, "relay".to_string(), state.to_string())
}

/// Gateway double recording every command
pub struct MockGateway {
    data: std::sync::Mutex<GatewayData>,
    calls: std::sync::Mutex<Vec<Call>>,
    updates: AtomicUsize,
    fail_commands: AtomicBool,
    fail_updates: AtomicBool,
}

impl MockGateway {
    pub fn from_fixture(fixture: &str) -> Self {
        Self {
            data: std::sync::Mutex::new(serde_json::from_str(fixture).unwrap()),
            calls: std::sync::Mutex::new(Vec::new()),
            updates: AtomicUsize::new(0),
            fail_commands: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
        }
    }

    pub fn modify(&self, f: impl FnOnce(&mut GatewayData)) {
        f(&mut self.data.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Option<Call> {
        self.calls.lock().unwrap().last().cloned()
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn fail_commands(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: Call) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(GatewayError::ResponseError("mocked failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GatewayApi for MockGateway {
    async fn async_update(&self) -> Result<GatewayData, GatewayError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(GatewayError::Connection("timeout".to_string()));
        }
        Ok(self.data.lock().unwrap().clone())
    }

    async fn set_temperature(&self, loc_id: &str, temperature: f64) -> Result<(), GatewayError> {
        self.record(Call::SetTemperature(loc_id.to_string(), temperature))
    }

    async fn set_schedule_state(
        &self,
        loc_id: &str,
        last_used: Option<String>,
        state: &str,
    ) -> Result<(), GatewayError> {
        self.record(Call::SetScheduleState(
            loc_id.to_string(),
            last_used,
            state.to_string(),
        ))
    }

    async fn set_preset(&self, loc_id: &str, preset: &str) -> Result<(), GatewayError> {
        self.record(Call::SetPreset(loc_id.to_string(), preset.to_string()))
    }

    async fn set_switch_state(
        &self,
        appliance: &str,
        members: Option<Vec<String>>,
        model: &str,
        state: &str,
    ) -> Result<(), GatewayError> {
        self.record(Call::SetSwitchState(
            appliance.to_string(),
            members,
            model.to_string(),
            state.to_string(),
        ))
    }
}

/// A set up integration
pub struct Harness {
    pub gateway: Arc<MockGateway>,
    pub coordinator: Arc<PlugwiseCoordinator>,
    pub states: Arc<StateMachine>,
    pub registry: Arc<EntityRegistry>,
    pub climate: EntityComponent<dyn ClimateEntity>,
    pub switch: EntityComponent<dyn SwitchEntity>,
    pub entities: PlugwiseEntities,
}

impl Harness {
    pub async fn new(gateway: MockGateway) -> Self {
        Self::with_registry(gateway, Arc::new(EntityRegistry::new())).await
    }

    pub async fn with_registry(gateway: MockGateway, registry: Arc<EntityRegistry>) -> Self {
        let gateway = Arc::new(gateway);
        let states = Arc::new(StateMachine::new());
        let coordinator = PlugwiseCoordinator::connect(
            gateway.clone(),
            Some(PlugwiseConfig::new("1.1.1.1", "test-password")),
        )
        .await
        .unwrap();

        let climate = EntityComponent::new(climate::DOMAIN, states.clone(), registry.clone());
        let switch = EntityComponent::new(switch::DOMAIN, states.clone(), registry.clone());
        let entities = setup_entry(coordinator.clone(), &climate, &switch, &registry)
            .await
            .unwrap();

        Self {
            gateway,
            coordinator,
            states,
            registry,
            climate,
            switch,
            entities,
        }
    }

    pub fn state(&self, entity_id: &str) -> State {
        self.states
            .get(entity_id)
            .unwrap_or_else(|| panic!("no state for {}", entity_id))
    }

    pub async fn switch_service(
        &self,
        service: &str,
        entity_id: &str,
    ) -> ha_components::HomeAssistantResult<()> {
        self.switch
            .handle_service(&service_call(switch::DOMAIN, service, entity_id, Value::Null))
            .await
    }

    pub async fn climate_service(
        &self,
        service: &str,
        entity_id: &str,
        data: Value,
    ) -> ha_components::HomeAssistantResult<()> {
        self.climate
            .handle_service(&service_call(climate::DOMAIN, service, entity_id, data))
            .await
    }

    /// Refresh the coordinator and wait until `entity_id` was rewritten
    pub async fn refresh_and_wait(&self, entity_id: &str) -> State {
        let mut changes = self.states.subscribe();
        let _ = self.coordinator.refresh().await;
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let change = changes.recv().await.unwrap();
                if change.entity_id.to_string() == entity_id {
                    return change.new_state.unwrap();
                }
            }
        })
        .await
        .expect("entity was not updated")
    }
}

pub fn service_call(domain: &str, service: &str, entity_id: &str, data: Value) -> ServiceCall {
    let mut data = match data {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Default::default()),
    };
    data["entity_id"] = Value::String(entity_id.to_string());
    ServiceCall::new(domain, service, data, Context::new())
}
