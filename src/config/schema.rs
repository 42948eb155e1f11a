//! Static configuration schema.
//!
//! This is the configuration read once at startup. It decides which providers
//! are registered and how the process logs. The routing state itself arrives
//! later, through the providers, as [`Configuration`](super::Configuration)
//! snapshots.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root static configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StaticConfig {
    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Provider definitions.
    pub providers: ProvidersConfig,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format (text, pretty, json).
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// The set of configured providers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Capacity of the shared channel every provider writes into.
    pub channel_capacity: usize,

    /// Local file provider.
    pub file: Option<FileProviderConfig>,

    /// REST push provider.
    pub rest: Option<RestProviderConfig>,

    /// HTTP polling providers.
    pub http: Vec<HttpProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 100,
            file: None,
            rest: None,
            http: Vec::new(),
        }
    }
}

/// File provider configuration.
///
/// When both `filename` and `directory` are set, `directory` wins.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Single TOML file holding the dynamic configuration.
    pub filename: Option<PathBuf>,

    /// Directory of TOML files, loaded recursively.
    pub directory: Option<PathBuf>,

    /// Reload on filesystem changes.
    pub watch: bool,
}

/// REST provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RestProviderConfig {
    /// Bind address of the push endpoint (e.g., "127.0.0.1:8099").
    pub bind_address: String,
}

impl Default for RestProviderConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8099".to_string(),
        }
    }
}

/// HTTP polling provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpProviderConfig {
    /// Provider name carried by every message (default: "http").
    #[serde(default = "default_http_name")]
    pub name: String,

    /// Endpoint returning a JSON dynamic configuration.
    pub endpoint: String,

    /// Interval between two polls in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_http_name() -> String {
    "http".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_poll_timeout() -> u64 {
    5
}

impl HttpProviderConfig {
    /// Config for `endpoint` with every other field at its default.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            name: default_http_name(),
            endpoint: endpoint.into(),
            poll_interval_secs: default_poll_interval(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}
