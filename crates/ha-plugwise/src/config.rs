//! Connection settings of a Smile

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_PORT, DEFAULT_USERNAME};

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

/// Settings of one configured gateway
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlugwiseConfig {
    pub host: String,
    pub password: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
}

impl PlugwiseConfig {
    pub fn new(host: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            password: password.into(),
            port: DEFAULT_PORT,
            username: default_username(),
        }
    }

    /// Web interface of the gateway, shown on its device page
    pub fn configuration_url(&self) -> String {
        format!("http://{}", self.host)
    }
}

impl std::fmt::Debug for PlugwiseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlugwiseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"**REDACTED**")
            .finish()
    }
}
