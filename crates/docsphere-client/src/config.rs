//! Client configuration.
//!
//! All values have defaults matching the platform's observed policies;
//! a TOML file can override any subset of them.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ClientError, ClientResult};

/// Tunable knobs for the client components.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the remote document store.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Quiet period for the collaborator search debounce.
    pub search_quiet_ms: u64,
    /// Quiet period for the autosave debounce.
    pub autosave_quiet_ms: u64,
    /// TTL for cached document lists.
    pub list_cache_ttl_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api/v1".to_string(),
            request_timeout_secs: 30,
            search_quiet_ms: 300,
            autosave_quiet_ms: 1000,
            list_cache_ttl_secs: 5 * 60,
        }
    }
}

impl ClientConfig {
    /// Parse a configuration from TOML, falling back to defaults for
    /// absent keys.
    pub fn from_toml_str(raw: &str) -> ClientResult<Self> {
        toml::from_str(raw).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_quiet(&self) -> Duration {
        Duration::from_millis(self.search_quiet_ms)
    }

    pub fn autosave_quiet(&self) -> Duration {
        Duration::from_millis(self.autosave_quiet_ms)
    }

    pub fn list_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.list_cache_ttl_secs)
    }
}
