//! Dynamic configuration aggregation for a reverse proxy control plane.
//!
//! Providers (local files, REST pushes, polled endpoints) each produce full
//! configuration snapshots. The [`ProviderAggregator`] launches them, file
//! provider first, and fans every snapshot into one channel drained by the
//! [`ConfigurationWatcher`].

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod provider;
pub mod resilience;

pub use config::{Configuration, ConfigurationWatcher, StaticConfig};
pub use lifecycle::{Pool, Shutdown};
pub use provider::{Message, Provider, ProviderAggregator, ProviderError, Registration};
