//! Dynamic configuration watcher.
//!
//! Drains the aggregated provider channel and keeps the latest snapshot of
//! every provider, published through an atomic swap so readers never wait on
//! the writer.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::mpsc;

use crate::config::Configuration;
use crate::lifecycle::StopSignal;
use crate::observability::metrics;
use crate::provider::Message;

/// Latest snapshot per provider name.
pub type Snapshots = BTreeMap<String, Configuration>;

/// Consumer side of the provider pipeline.
///
/// Cloning yields another handle on the same published state. Only one clone
/// should run [`ConfigurationWatcher::run`] or call
/// [`ConfigurationWatcher::apply`]; any number may read.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationWatcher {
    current: Arc<ArcSwap<Snapshots>>,
}

impl ConfigurationWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshots, keyed by provider name.
    pub fn snapshot(&self) -> Arc<Snapshots> {
        self.current.load_full()
    }

    /// Record one message. Returns `false` when it repeated the provider's
    /// current snapshot and was skipped.
    pub fn apply(&self, message: Message) -> bool {
        let Message {
            provider_name,
            configuration,
        } = message;

        let current = self.current.load();
        if current.get(&provider_name) == Some(&configuration) {
            tracing::debug!(provider = %provider_name, "Skipping same configuration");
            metrics::record_configuration_skipped(&provider_name);
            return false;
        }

        tracing::info!(
            provider = %provider_name,
            routes = configuration.routes.len(),
            backends = configuration.backends.len(),
            "Configuration received"
        );
        metrics::record_message(&provider_name);

        let mut next = Snapshots::clone(&current);
        next.insert(provider_name, configuration);
        self.current.store(Arc::new(next));
        true
    }

    /// Apply messages until the channel closes or `stop` fires.
    pub async fn run(&self, mut messages: mpsc::Receiver<Message>, mut stop: StopSignal) {
        loop {
            tokio::select! {
                _ = stop.stopped() => break,
                message = messages.recv() => match message {
                    Some(message) => {
                        self.apply(message);
                    }
                    None => break,
                },
            }
        }
        tracing::debug!("Configuration watcher stopped");
    }
}
