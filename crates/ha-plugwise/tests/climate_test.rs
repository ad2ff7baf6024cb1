//! Plugwise climate platform tests

mod common;

use common::{Call, Harness, MockGateway, ADAM};
use ha_components::HomeAssistantError;
use serde_json::json;

const LISA_WK: &str = "climate.zone_lisa_wk";
const LISA_WK_LOC: &str = "c50f167537524366a5af7aa3942feb1e";
const JESSIE: &str = "climate.zone_thermostat_jessie";
const KRAAN: &str = "climate.cv_kraan_garage";
const KRAAN_LOC: &str = "446ac08dd04d4eff8ac57489757b7314";

#[tokio::test]
async fn test_adam_climate_entity_attributes() {
    let harness = Harness::new(MockGateway::from_fixture(ADAM)).await;
    assert_eq!(harness.climate.entity_ids(), vec![KRAAN, LISA_WK, JESSIE]);

    let state = harness.state(LISA_WK);
    assert_eq!(state.state, "auto");
    assert_eq!(state.attributes["hvac_modes"], json!(["heat", "auto", "off"]));
    assert_eq!(
        state.attributes["preset_modes"],
        json!(["asleep", "away", "home", "no_frost", "vacation"])
    );
    assert_eq!(state.attributes["preset_mode"], json!("home"));
    assert_eq!(state.attributes["current_temperature"], json!(20.9));
    assert_eq!(state.attributes["temperature"], json!(21.5));
    assert_eq!(state.attributes["min_temp"], json!(4.0));
    assert_eq!(state.attributes["max_temp"], json!(30.0));
    assert_eq!(state.attributes["hvac_action"], json!("heating"));
    assert_eq!(state.attributes["supported_features"], json!(17));
    assert_eq!(state.attributes["selected_schema"], json!("GF7  Woonkamer"));
    assert_eq!(
        state.attributes["available_schemas"],
        json!(["CV Roan", "Bios Schedule", "GF7  Woonkamer", "Badkamer Schema", "CV Jessie"])
    );

    let state = harness.state(JESSIE);
    assert_eq!(state.state, "auto");
    assert_eq!(state.attributes["preset_mode"], json!("asleep"));

    let state = harness.state(KRAAN);
    assert_eq!(state.state, "heat");
    assert_eq!(state.attributes["preset_mode"], json!("no_frost"));
    assert_eq!(state.attributes["temperature"], json!(5.5));
    assert_eq!(state.attributes["selected_schema"], json!(null));
}

#[tokio::test]
async fn test_adam_climate_entity_climate_changes() {
    let harness = Harness::new(MockGateway::from_fixture(ADAM)).await;

    harness
        .climate_service("set_temperature", LISA_WK, json!({"temperature": 25}))
        .await
        .unwrap();
    assert_eq!(
        harness.gateway.calls(),
        vec![Call::SetTemperature(LISA_WK_LOC.to_string(), 25.0)]
    );

    harness
        .climate_service("set_preset_mode", LISA_WK, json!({"preset_mode": "away"}))
        .await
        .unwrap();
    assert_eq!(
        harness.gateway.last_call(),
        Some(Call::SetPreset(LISA_WK_LOC.to_string(), "away".to_string()))
    );

    harness
        .climate_service("set_hvac_mode", KRAAN, json!({"hvac_mode": "heat"}))
        .await
        .unwrap();
    assert_eq!(
        harness.gateway.last_call(),
        Some(Call::SetScheduleState(
            KRAAN_LOC.to_string(),
            Some("Badkamer Schema".to_string()),
            "false".to_string()
        ))
    );
}

#[tokio::test]
async fn test_set_hvac_mode_auto_applies_schedule_temperature() {
    let harness = Harness::new(MockGateway::from_fixture(ADAM)).await;

    harness
        .climate_service("set_hvac_mode", LISA_WK, json!({"hvac_mode": "auto"}))
        .await
        .unwrap();
    assert_eq!(
        harness.gateway.calls(),
        vec![
            Call::SetTemperature(LISA_WK_LOC.to_string(), 20.0),
            Call::SetScheduleState(
                LISA_WK_LOC.to_string(),
                Some("GF7  Woonkamer".to_string()),
                "true".to_string()
            ),
        ]
    );

    // Without a schedule temperature only the schedule is switched on
    harness
        .climate_service("set_hvac_mode", KRAAN, json!({"hvac_mode": "auto"}))
        .await
        .unwrap();
    assert_eq!(
        harness.gateway.last_call(),
        Some(Call::SetScheduleState(
            KRAAN_LOC.to_string(),
            Some("Badkamer Schema".to_string()),
            "true".to_string()
        ))
    );
    assert_eq!(harness.gateway.calls().len(), 3);
}

#[tokio::test]
async fn test_set_temperature_with_hvac_mode() {
    let harness = Harness::new(MockGateway::from_fixture(ADAM)).await;

    harness
        .climate_service(
            "set_temperature",
            KRAAN,
            json!({"temperature": 18.5, "hvac_mode": "heat"}),
        )
        .await
        .unwrap();
    assert_eq!(
        harness.gateway.calls(),
        vec![
            Call::SetScheduleState(
                KRAAN_LOC.to_string(),
                Some("Badkamer Schema".to_string()),
                "false".to_string()
            ),
            Call::SetTemperature(KRAAN_LOC.to_string(), 18.5),
        ]
    );
}

#[tokio::test]
async fn test_invalid_temperature_is_rejected() {
    let harness = Harness::new(MockGateway::from_fixture(ADAM)).await;
    let updates = harness.gateway.update_count();

    for data in [json!({"temperature": 35}), json!({"temperature": 3.9}), json!({})] {
        let err = harness
            .climate_service("set_temperature", LISA_WK, data)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            HomeAssistantError::InvalidValue("Invalid temperature requested".to_string())
        );
    }
    assert!(harness.gateway.calls().is_empty());
    assert_eq!(harness.gateway.update_count(), updates + 3);

    harness
        .climate_service("set_temperature", LISA_WK, json!({"temperature": 30}))
        .await
        .unwrap();
    assert_eq!(
        harness.gateway.calls(),
        vec![Call::SetTemperature(LISA_WK_LOC.to_string(), 30.0)]
    );
}

#[tokio::test]
async fn test_adam_climate_entity_negative_testing() {
    let harness = Harness::new(MockGateway::from_fixture(ADAM)).await;
    harness.gateway.fail_commands(true);

    let err = harness
        .climate_service("set_temperature", LISA_WK, json!({"temperature": 25}))
        .await
        .unwrap_err();
    assert!(matches!(err, HomeAssistantError::Integration(_)));

    let err = harness
        .climate_service("set_preset_mode", LISA_WK, json!({"preset_mode": "away"}))
        .await
        .unwrap_err();
    assert!(matches!(err, HomeAssistantError::Integration(_)));

    let err = harness
        .climate_service("set_hvac_mode", LISA_WK, json!({"hvac_mode": "auto"}))
        .await
        .unwrap_err();
    assert!(matches!(err, HomeAssistantError::Integration(_)));
    assert_eq!(harness.gateway.calls().len(), 3);
}

#[tokio::test]
async fn test_preset_without_presets() {
    let gateway = MockGateway::from_fixture(ADAM);
    gateway.modify(|data| {
        let kraan = data.devices.get_mut("e7693eb9582644e5b865dba8d4447cf1").unwrap();
        kraan.presets.clear();
    });
    let harness = Harness::new(gateway).await;

    // preset_mode is cleared when the device has no presets
    let state = harness.state(KRAAN);
    assert_eq!(state.attributes["preset_mode"], json!(null));
    assert_eq!(state.attributes["preset_modes"], json!(null));

    let err = harness
        .climate_service("set_preset_mode", KRAAN, json!({"preset_mode": "home"}))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        HomeAssistantError::InvalidValue("No presets available".to_string())
    );
    assert!(harness.gateway.calls().is_empty());
}

#[tokio::test]
async fn test_coordinator_update_rederives_state() {
    let harness = Harness::new(MockGateway::from_fixture(ADAM)).await;

    harness.gateway.modify(|data| {
        data.gateway.cooling_present = true;
        let heater = data.devices.get_mut("90986d591dcd426cae3ec3e8111ff730").unwrap();
        heater.heating_state = Some(false);
        heater.cooling_state = Some(true);
        let lisa = data.devices.get_mut("b59bcebaf94b499ea7d46e4a66fb62d8").unwrap();
        lisa.sensors.setpoint = Some(23.0);
        lisa.sensors.temperature = None;
        lisa.mode = Some("cool".to_string());
        lisa.active_preset = Some("away".to_string());
    });

    let state = harness.refresh_and_wait(LISA_WK).await;
    assert_eq!(state.state, "cool");
    assert_eq!(
        state.attributes["hvac_modes"],
        json!(["heat", "cool", "auto", "off"])
    );
    assert_eq!(state.attributes["hvac_action"], json!("cooling"));
    assert_eq!(state.attributes["temperature"], json!(23.0));
    // A missing reading keeps the last known temperature
    assert_eq!(state.attributes["current_temperature"], json!(20.9));
    assert_eq!(state.attributes["preset_mode"], json!("away"));
}

#[tokio::test]
async fn test_unknown_mode_keeps_current_mode() {
    let harness = Harness::new(MockGateway::from_fixture(ADAM)).await;

    harness.gateway.modify(|data| {
        let kraan = data.devices.get_mut("e7693eb9582644e5b865dba8d4447cf1").unwrap();
        kraan.mode = Some("cool".to_string());
        kraan.sensors.setpoint = Some(6.0);
    });

    let state = harness.refresh_and_wait(KRAAN).await;
    assert_eq!(state.attributes["temperature"], json!(6.0));
    assert_eq!(state.state, "heat");
}

#[tokio::test]
async fn test_no_heater_means_idle() {
    let harness = Harness::new(MockGateway::from_fixture(ADAM)).await;
    assert_eq!(harness.state(LISA_WK).attributes["hvac_action"], json!("heating"));

    harness.gateway.modify(|data| {
        data.gateway.heater_id = None;
    });
    let state = harness.refresh_and_wait(LISA_WK).await;
    assert_eq!(state.attributes["hvac_action"], json!("idle"));

    // A heater id pointing at a device the gateway no longer reports
    harness.gateway.modify(|data| {
        data.gateway.heater_id = Some("90986d591dcd426cae3ec3e8111ff730".to_string());
        data.devices.remove("90986d591dcd426cae3ec3e8111ff730");
        data.devices
            .get_mut("b59bcebaf94b499ea7d46e4a66fb62d8")
            .unwrap()
            .sensors
            .setpoint = Some(19.0);
    });
    let state = harness.refresh_and_wait(LISA_WK).await;
    assert_eq!(state.attributes["temperature"], json!(19.0));
    assert_eq!(state.attributes["hvac_action"], json!("idle"));
}

#[tokio::test]
async fn test_zero_readings_are_applied() {
    let harness = Harness::new(MockGateway::from_fixture(ADAM)).await;

    harness.gateway.modify(|data| {
        let lisa = data.devices.get_mut("b59bcebaf94b499ea7d46e4a66fb62d8").unwrap();
        lisa.sensors.setpoint = Some(0.0);
        lisa.sensors.temperature = Some(0.0);
    });
    let state = harness.refresh_and_wait(LISA_WK).await;
    assert_eq!(state.attributes["temperature"], json!(0.0));
    assert_eq!(state.attributes["current_temperature"], json!(0.0));
}

#[tokio::test]
async fn test_thermostat_device_info() {
    let harness = Harness::new(MockGateway::from_fixture(ADAM)).await;
    let climate = harness.entities.climates[0].clone();
    let guard = climate.lock().await;
    let info = ha_components::Entity::base(&*guard)
        .device_info
        .clone()
        .unwrap();

    assert_eq!(
        info.identifiers,
        vec![("plugwise".to_string(), "6a3bf693d05e48e0b460c815a4fdd09d".to_string())]
    );
    assert_eq!(info.name.as_deref(), Some("Zone Thermostat Jessie"));
    assert_eq!(info.model.as_deref(), Some("Tom/Floor"));
    assert_eq!(
        info.connections,
        vec![("zigbee".to_string(), "ABCD012345670A03".to_string())]
    );
    assert_eq!(
        info.via_device,
        Some(("plugwise".to_string(), "fe799307f1624099878210aa0b9f1475".to_string()))
    );
}
