//! Dynamic configuration payload.
//!
//! A [`Configuration`] is one full snapshot of a provider's routing state. The
//! aggregation pipeline never looks inside it; only the providers that build
//! it and the consumer that merges it care about its fields.

use serde::{Deserialize, Serialize};

/// One provider's full routing snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Configuration {
    /// Route definitions mapping requests to backends.
    pub routes: Vec<RouteConfig>,

    /// Backend server definitions.
    pub backends: Vec<BackendConfig>,
}

impl Configuration {
    /// True when the snapshot defines nothing at all.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.backends.is_empty()
    }

    /// Merge `other` into `self`.
    ///
    /// Names already present win; every duplicate that gets dropped is
    /// reported back as `(kind, name)`.
    pub fn merge(&mut self, other: Configuration) -> Vec<(&'static str, String)> {
        let mut skipped = Vec::new();

        for route in other.routes {
            if self.routes.iter().any(|r| r.name == route.name) {
                skipped.push(("route", route.name));
            } else {
                self.routes.push(route);
            }
        }

        for backend in other.backends {
            if self.backends.iter().any(|b| b.name == backend.name) {
                skipped.push(("backend", backend.name));
            } else {
                self.backends.push(backend);
            }
        }

        skipped
    }
}

/// Route configuration mapping requests to backend groups.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Host header to match (exact match).
    pub host: Option<String>,

    /// Path prefix to match.
    pub path_prefix: Option<String>,

    /// Backend group name to forward to.
    pub backend_group: String,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,
}

/// Backend server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier.
    pub name: String,

    /// Backend group this server belongs to.
    pub group: String,

    /// Backend address (e.g., "127.0.0.1:3000").
    pub address: String,

    /// Weight for weighted load balancing (default: 1).
    #[serde(default = "default_weight")]
    pub weight: u32,

    /// Maximum concurrent connections to this backend.
    #[serde(default = "default_max_backend_conns")]
    pub max_connections: usize,
}

fn default_weight() -> u32 {
    1
}

fn default_max_backend_conns() -> usize {
    100
}
