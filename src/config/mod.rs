//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! static config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → StaticConfig (decides which providers run)
//!
//! dynamic configuration (per provider):
//!     providers send full Configuration snapshots
//!     → watcher.rs keeps the latest per provider
//!     → atomic swap of the published snapshot map
//! ```
//!
//! # Design Decisions
//! - Static config is immutable once loaded
//! - Dynamic snapshots replace each other wholesale; there are no deltas
//! - Validation separates syntactic (serde) from semantic checks

pub mod dynamic;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use dynamic::{BackendConfig, Configuration, RouteConfig};
pub use schema::{FileProviderConfig, HttpProviderConfig, ProvidersConfig, RestProviderConfig, StaticConfig};
pub use watcher::ConfigurationWatcher;
