use ha_components::switch;
use ha_registries::{EntityRegistry, EntityRegistryError};
use tracing::info;

use crate::DOMAIN;

/// Rename `{dev_id}-plug` switch unique ids to `{dev_id}-relay`
///
/// Migrated entries keep their entity_id. Returns the number of entries
/// changed.
pub fn migrate_unique_ids(registry: &EntityRegistry) -> Result<usize, EntityRegistryError> {
    let migrated = registry.migrate_entries(DOMAIN, |entry| {
        if entry.domain() != switch::DOMAIN {
            return None;
        }
        entry
            .unique_id
            .strip_suffix("-plug")
            .map(|dev_id| format!("{}-relay", dev_id))
    })?;
    if migrated > 0 {
        info!(migrated, "Migrated Plugwise switch unique ids");
    }
    Ok(migrated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ha_core::EntityId;

    #[test]
    fn test_plug_is_renamed_to_relay() {
        let registry = EntityRegistry::new();
        registry
            .register(
                EntityId::new("switch", "playstation_smart_plug").unwrap(),
                DOMAIN,
                "21f2b542c49845e6bb416884c55778d6-plug",
            )
            .unwrap();
        registry
            .register(
                EntityId::new("switch", "router").unwrap(),
                DOMAIN,
                "675416a629f343c495449970e2ca37b5-relay",
            )
            .unwrap();
        registry
            .register(
                EntityId::new("sensor", "outlet_plug").unwrap(),
                DOMAIN,
                "aaaa-plug",
            )
            .unwrap();

        assert_eq!(migrate_unique_ids(&registry).unwrap(), 1);

        let entry = registry.get("switch.playstation_smart_plug").unwrap();
        assert_eq!(entry.unique_id, "21f2b542c49845e6bb416884c55778d6-relay");
        assert_eq!(
            entry.previous_unique_id.as_deref(),
            Some("21f2b542c49845e6bb416884c55778d6-plug")
        );
        assert_eq!(
            registry.get("switch.router").unwrap().unique_id,
            "675416a629f343c495449970e2ca37b5-relay"
        );
        assert_eq!(registry.get("sensor.outlet_plug").unwrap().unique_id, "aaaa-plug");

        assert_eq!(migrate_unique_ids(&registry).unwrap(), 0);
    }
}
