//! Per-client configuration.

use serde::{Deserialize, Serialize};

use super::site::pick;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub name: String,
    /// Backend dialect, the key used to look up a constructor in the client registry.
    #[serde(rename = "type")]
    pub client_type: String,
    pub url: String,
    pub username: String,
    pub password: String,
}

impl ClientConfig {
    /// Fill every empty field from `defaults`.
    pub fn merged_over(&self, defaults: &ClientConfig) -> ClientConfig {
        ClientConfig {
            name: pick(&self.name, &defaults.name),
            client_type: pick(&self.client_type, &defaults.client_type),
            url: pick(&self.url, &defaults.url),
            username: pick(&self.username, &defaults.username),
            password: pick(&self.password, &defaults.password),
        }
    }
}
