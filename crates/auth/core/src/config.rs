//! Provider configuration.
//!
//! Loaded once at startup and validated fast: a provider must never come up
//! without at least one trusted server to delegate verification to.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Immutable provider configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Administrative kill switch. Enabled by default.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Trusted verification servers, in failover priority order. The first
    /// listed is always tried first.
    pub trusted_servers: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl ProviderConfig {
    /// Builds a validated configuration. Fails when `trusted_servers` is
    /// empty; entries are normalized by stripping trailing slashes.
    pub fn new(enabled: bool, trusted_servers: Vec<String>) -> Result<Self, ConfigError> {
        if trusted_servers.is_empty() {
            return Err(ConfigError::NoTrustedServers);
        }
        let trusted_servers = sanitize_trusted_servers(trusted_servers);
        info!(
            servers = %trusted_servers.join(", "),
            "will use the following trusted servers"
        );
        Ok(Self {
            enabled,
            trusted_servers,
        })
    }

    /// Parses the provider section of the homeserver configuration. The
    /// `trusted_servers` property must be a non-empty list of strings;
    /// `enabled` defaults to true when absent.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let servers = value
            .get("trusted_servers")
            .ok_or(ConfigError::MissingTrustedServers)?;
        let servers = servers
            .as_array()
            .ok_or(ConfigError::TrustedServersNotAList)?;
        let trusted_servers = servers
            .iter()
            .map(|entry| {
                entry
                    .as_str()
                    .map(str::to_string)
                    .ok_or(ConfigError::TrustedServersNotAList)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let enabled = value
            .get("enabled")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        Self::new(enabled, trusted_servers)
    }
}

fn sanitize_trusted_servers(trusted_servers: Vec<String>) -> Vec<String> {
    trusted_servers
        .into_iter()
        .map(|server| server.trim_end_matches('/').to_string())
        .collect()
}
