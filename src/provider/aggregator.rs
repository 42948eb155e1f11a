//! Provider aggregator.
//!
//! # Responsibilities
//! - Validate providers at registration (`init`)
//! - Run the file provider first, in the caller's task
//! - Launch every other provider as its own pool task
//! - Fan every provider into one shared output channel
//!
//! # Design Decisions
//! - The file provider is the deterministic bootstrap baseline, so its first
//!   snapshot is sent before any other provider starts
//! - Provider errors are logged here and never returned to the caller
//! - Launched feeds are not joined; the pool owns their lifetimes

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::lifecycle::Pool;
use crate::observability::metrics;
use crate::provider::{FileProvider, Message, Provider, ProviderError};

/// A provider handed to [`ProviderAggregator::add_provider`].
///
/// The `File` tag marks the single privileged provider that runs before all
/// others.
pub enum Registration {
    File(Box<dyn Provider>),
    Dynamic(Box<dyn Provider>),
}

impl Registration {
    /// Register `provider` as the privileged file provider.
    pub fn file(provider: impl Provider + 'static) -> Self {
        Self::File(Box::new(provider))
    }

    /// Register `provider` as an independent, concurrently launched provider.
    pub fn dynamic(provider: impl Provider + 'static) -> Self {
        Self::Dynamic(Box::new(provider))
    }
}

impl From<FileProvider> for Registration {
    fn from(provider: FileProvider) -> Self {
        Self::file(provider)
    }
}

impl From<Box<dyn Provider>> for Registration {
    fn from(provider: Box<dyn Provider>) -> Self {
        Self::Dynamic(provider)
    }
}

/// Launches every registered provider and fans them into one channel.
#[derive(Default)]
pub struct ProviderAggregator {
    file_provider: Option<Arc<dyn Provider>>,
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize and store a provider.
    ///
    /// A new file provider replaces the previous one. On error nothing is
    /// stored; callers are expected to log and keep going.
    pub fn add_provider(&mut self, registration: impl Into<Registration>) -> Result<(), ProviderError> {
        match registration.into() {
            Registration::File(mut provider) => {
                init_provider(&mut *provider)?;
                if let Some(previous) = self.file_provider.replace(Arc::from(provider)) {
                    tracing::warn!(provider = previous.name(), "Replacing previously registered file provider");
                }
            }
            Registration::Dynamic(mut provider) => {
                init_provider(&mut *provider)?;
                self.providers.push(Arc::from(provider));
            }
        }
        Ok(())
    }

    /// Names of the registered providers, file provider first.
    pub fn provider_names(&self) -> Vec<String> {
        self.file_provider
            .iter()
            .chain(self.providers.iter())
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.file_provider.is_none() && self.providers.is_empty()
    }
}

fn init_provider(provider: &mut dyn Provider) -> Result<(), ProviderError> {
    let name = provider.name().to_string();
    match provider.init() {
        Ok(()) => {
            tracing::debug!(provider = %name, "Provider initialized");
            Ok(())
        }
        Err(e) => {
            metrics::record_provider_failure(&name, "init");
            Err(e)
        }
    }
}

async fn launch_provider(provider: Arc<dyn Provider>, out: mpsc::Sender<Message>, pool: Pool) {
    tracing::info!(provider = provider.name(), "Starting provider");

    if let Err(e) = provider.provide(out, pool).await {
        metrics::record_provider_failure(provider.name(), "provide");
        tracing::error!(provider = provider.name(), error = %e, "Cannot provide configuration");
    }
}

#[async_trait]
impl Provider for ProviderAggregator {
    fn name(&self) -> &str {
        "aggregator"
    }

    fn init(&mut self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn provide(&self, out: mpsc::Sender<Message>, pool: Pool) -> Result<(), ProviderError> {
        if let Some(file) = &self.file_provider {
            launch_provider(Arc::clone(file), out.clone(), pool.clone()).await;
        }

        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let out = out.clone();
            let task_pool = pool.clone();
            pool.go(launch_provider(provider, out, task_pool));
        }

        Ok(())
    }
}
