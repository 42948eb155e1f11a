//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every configured provider
//! - Register them with the aggregator
//!
//! # Design Decisions
//! - A provider that fails to initialize is logged and skipped; the others
//!   still start
//! - The file provider is registered first but its position does not matter:
//!   the aggregator always runs it before the rest

use crate::config::ProvidersConfig;
use crate::provider::{FileProvider, HttpProvider, ProviderAggregator, Registration, RestProvider};

/// Build the aggregator for the configured providers.
pub fn register_providers(config: &ProvidersConfig) -> ProviderAggregator {
    let mut aggregator = ProviderAggregator::new();

    let mut registrations: Vec<Registration> = Vec::new();
    if let Some(file) = &config.file {
        registrations.push(FileProvider::new(file.clone()).into());
    }
    if let Some(rest) = &config.rest {
        registrations.push(Registration::dynamic(RestProvider::new(rest.clone())));
    }
    for http in &config.http {
        registrations.push(Registration::dynamic(HttpProvider::new(http.clone())));
    }

    for registration in registrations {
        let name = match &registration {
            Registration::File(p) | Registration::Dynamic(p) => p.name().to_string(),
        };
        match aggregator.add_provider(registration) {
            Ok(()) => tracing::info!(provider = %name, "Provider registered"),
            Err(e) => tracing::error!(provider = %name, error = %e, "Cannot register provider, skipping"),
        }
    }

    aggregator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileProviderConfig, HttpProviderConfig, RestProviderConfig};

    #[test]
    fn test_broken_provider_does_not_block_others() {
        let config = ProvidersConfig {
            channel_capacity: 10,
            file: Some(FileProviderConfig {
                filename: Some("/no/such/file.toml".into()),
                ..Default::default()
            }),
            rest: Some(RestProviderConfig {
                bind_address: "127.0.0.1:0".into(),
            }),
            http: vec![HttpProviderConfig::new("http://127.0.0.1:1/config")],
        };

        let aggregator = register_providers(&config);
        assert_eq!(aggregator.provider_names(), vec!["rest", "http"]);
    }
}
