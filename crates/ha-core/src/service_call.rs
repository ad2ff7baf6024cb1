//! Service call type for invoking entity services

use crate::{Context, EntityId};
use serde::{Deserialize, Serialize};

/// Represents a call to an entity service such as `lock.unlock`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCall {
    /// The domain the service belongs to (e.g., "lock", "switch", "climate")
    pub domain: String,

    /// The service name (e.g., "lock", "toggle", "set_temperature")
    pub service: String,

    /// Data passed to the service (entity_id plus service specific fields)
    pub service_data: serde_json::Value,

    /// Context tracking who initiated this call
    pub context: Context,
}

impl ServiceCall {
    /// Create a new service call
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        service_data: serde_json::Value,
        context: Context,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            service_data,
            context,
        }
    }

    /// Get the full service identifier (domain.service)
    pub fn service_id(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }

    /// Get a value from service_data
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.service_data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Deserialize the whole service_data into a typed request
    pub fn data<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.service_data.clone())
    }

    /// Get the targeted entity IDs
    ///
    /// Accepts both a single string and an array. Entries that are not valid
    /// entity IDs are dropped.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        match self.service_data.get("entity_id") {
            Some(serde_json::Value::String(s)) => s.parse::<EntityId>().into_iter().collect(),
            Some(serde_json::Value::Array(arr)) => arr
                .iter()
                .filter_map(|v| v.as_str())
                .filter_map(|s| s.parse().ok())
                .collect(),
            _ => vec![],
        }
    }
}
