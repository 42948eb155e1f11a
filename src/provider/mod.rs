//! Dynamic configuration providers.
//!
//! # Data Flow
//! ```text
//! file / rest / http sources
//!     → Provider::init (validate, build clients)
//!     → aggregator.rs (file provider first, then one pool task per provider)
//!     → Message { provider_name, configuration } on one shared channel
//!     → config::watcher (keeps the latest snapshot per provider)
//! ```
//!
//! # Design Decisions
//! - Every message is a full snapshot, never a delta
//! - Providers share the output sender and never close it
//! - A failing provider stops only its own feed
//! - Bursty sources coalesce through ring.rs so they never block

pub mod aggregator;
pub mod file;
pub mod http;
pub mod rest;
pub mod ring;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::Configuration;
use crate::lifecycle::Pool;

pub use aggregator::{ProviderAggregator, Registration};
pub use file::FileProvider;
pub use http::HttpProvider;
pub use rest::RestProvider;
pub use ring::{ring_channel, RingReceiver, RingSender};

/// One provider's full configuration snapshot, tagged with its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub provider_name: String,
    pub configuration: Configuration,
}

impl Message {
    pub fn new(provider_name: impl Into<String>, configuration: Configuration) -> Self {
        Self {
            provider_name: provider_name.into(),
            configuration,
        }
    }
}

/// Errors raised while setting up or running a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider's own settings are unusable.
    #[error("invalid provider configuration: {0}")]
    Config(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The shared output channel has no receiver anymore.
    #[error("configuration channel closed")]
    Closed,
}

/// A source of dynamic configuration.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Name carried by every message this provider sends.
    fn name(&self) -> &str;

    /// One-shot setup. A failure here leaves no background work behind.
    fn init(&mut self) -> Result<(), ProviderError>;

    /// Start feeding messages into `out`.
    ///
    /// May return right after scheduling work on `pool`, or run for the whole
    /// life of the feed. Must stop sending once the pool signals shutdown.
    async fn provide(&self, out: mpsc::Sender<Message>, pool: Pool) -> Result<(), ProviderError>;
}

/// Send one snapshot on the shared channel.
pub(crate) async fn send_configuration(
    out: &mpsc::Sender<Message>,
    provider_name: &str,
    configuration: Configuration,
) -> Result<(), ProviderError> {
    out.send(Message::new(provider_name, configuration))
        .await
        .map_err(|_| ProviderError::Closed)
}
