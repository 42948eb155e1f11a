//! Static configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (capacity > 0, intervals > 0)
//! - Validate addresses and URLs before any provider is built
//! - Detect provider name collisions
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: StaticConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::StaticConfig;

/// A single semantic problem found in the static configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("providers.channel_capacity must be greater than zero")]
    ZeroChannelCapacity,

    #[error("file provider needs a filename or a directory")]
    FileProviderWithoutPath,

    #[error("invalid {field} address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("invalid endpoint for http provider {name}: {endpoint}")]
    InvalidEndpoint { name: String, endpoint: String },

    #[error("{field} of http provider {name} must be greater than zero")]
    ZeroInterval { name: String, field: &'static str },

    #[error("unknown log format: {0}")]
    UnknownLogFormat(String),

    #[error("provider name {0} is used more than once")]
    DuplicateProviderName(String),
}

/// Check a parsed static configuration.
pub fn validate_config(config: &StaticConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.observability.log_format.as_str() {
        "text" | "pretty" | "json" => {}
        other => errors.push(ValidationError::UnknownLogFormat(other.to_string())),
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let providers = &config.providers;
    if providers.channel_capacity == 0 {
        errors.push(ValidationError::ZeroChannelCapacity);
    }

    if let Some(file) = &providers.file {
        if file.filename.is_none() && file.directory.is_none() {
            errors.push(ValidationError::FileProviderWithoutPath);
        }
    }

    let mut names: HashSet<&str> = HashSet::new();
    if providers.file.is_some() {
        names.insert("file");
    }

    if let Some(rest) = &providers.rest {
        names.insert("rest");
        if rest.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                field: "providers.rest.bind_address",
                value: rest.bind_address.clone(),
            });
        }
    }

    for http in &providers.http {
        if !names.insert(http.name.as_str()) {
            errors.push(ValidationError::DuplicateProviderName(http.name.clone()));
        }
        if reqwest::Url::parse(&http.endpoint).is_err() {
            errors.push(ValidationError::InvalidEndpoint {
                name: http.name.clone(),
                endpoint: http.endpoint.clone(),
            });
        }
        if http.poll_interval_secs == 0 {
            errors.push(ValidationError::ZeroInterval {
                name: http.name.clone(),
                field: "poll_interval_secs",
            });
        }
        if http.poll_timeout_secs == 0 {
            errors.push(ValidationError::ZeroInterval {
                name: http.name.clone(),
                field: "poll_timeout_secs",
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{FileProviderConfig, HttpProviderConfig, RestProviderConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&StaticConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = StaticConfig::default();
        config.observability.log_format = "xml".into();
        config.providers.channel_capacity = 0;
        config.providers.file = Some(FileProviderConfig::default());
        config.providers.rest = Some(RestProviderConfig {
            bind_address: "nowhere".into(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroChannelCapacity));
        assert!(errors.contains(&ValidationError::FileProviderWithoutPath));
        assert!(errors.contains(&ValidationError::UnknownLogFormat("xml".into())));
    }

    #[test]
    fn test_http_provider_checks() {
        let mut config = StaticConfig::default();
        let mut bad = HttpProviderConfig::new("not a url");
        bad.poll_interval_secs = 0;
        config.providers.http = vec![bad, HttpProviderConfig::new("http://127.0.0.1:1/")];

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::InvalidEndpoint {
            name: "http".into(),
            endpoint: "not a url".into(),
        }));
        assert!(errors.contains(&ValidationError::ZeroInterval {
            name: "http".into(),
            field: "poll_interval_secs",
        }));
        assert!(errors.contains(&ValidationError::DuplicateProviderName("http".into())));
    }
}
