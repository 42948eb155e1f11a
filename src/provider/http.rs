//! HTTP polling provider.
//!
//! Polls an endpoint returning a JSON [`Configuration`] and sends a snapshot
//! whenever the body changes. Transient failures are retried with backoff,
//! never more slowly than the poll interval.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tokio::sync::mpsc;

use crate::config::schema::HttpProviderConfig;
use crate::config::Configuration;
use crate::lifecycle::{Pool, StopSignal};
use crate::provider::{send_configuration, Message, Provider, ProviderError};
use crate::resilience::Backoff;

const RETRY_BASE: Duration = Duration::from_millis(250);

/// Provider that polls a remote endpoint.
#[derive(Debug)]
pub struct HttpProvider {
    config: HttpProviderConfig,
    client: Option<Client>,
    url: Option<Url>,
}

impl HttpProvider {
    pub fn new(config: HttpProviderConfig) -> Self {
        Self {
            config,
            client: None,
            url: None,
        }
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn init(&mut self) -> Result<(), ProviderError> {
        let url = Url::parse(&self.config.endpoint)
            .map_err(|e| ProviderError::Config(format!("invalid endpoint {}: {e}", self.config.endpoint)))?;

        if self.config.poll_interval_secs == 0 || self.config.poll_timeout_secs == 0 {
            return Err(ProviderError::Config(
                "poll interval and timeout must be greater than zero".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.poll_timeout_secs))
            .build()?;

        self.url = Some(url);
        self.client = Some(client);
        Ok(())
    }

    async fn provide(&self, out: mpsc::Sender<Message>, pool: Pool) -> Result<(), ProviderError> {
        let (Some(client), Some(url)) = (self.client.clone(), self.url.clone()) else {
            return Err(ProviderError::Config("provider used before init".to_string()));
        };

        let poller = Poller {
            name: self.config.name.clone(),
            client,
            url,
            interval: Duration::from_secs(self.config.poll_interval_secs),
            out,
        };
        pool.go_ctx(move |stop| poller.run(stop));

        Ok(())
    }
}

struct Poller {
    name: String,
    client: Client,
    url: Url,
    interval: Duration,
    out: mpsc::Sender<Message>,
}

impl Poller {
    async fn run(self, mut stop: StopSignal) {
        tracing::info!(provider = %self.name, endpoint = %self.url, interval = ?self.interval, "Polling endpoint");

        let mut backoff = Backoff::new(RETRY_BASE, self.interval);
        let mut last_body: Option<Vec<u8>> = None;
        let mut delay = Duration::ZERO;

        loop {
            let fetched = tokio::select! {
                _ = stop.stopped() => break,
                fetched = async {
                    tokio::time::sleep(delay).await;
                    self.fetch().await
                } => fetched,
            };

            let body = match fetched {
                Ok(body) => {
                    backoff.reset();
                    delay = self.interval;
                    body
                }
                Err(e) => {
                    delay = backoff.next_delay();
                    tracing::warn!(
                        provider = %self.name,
                        error = %e,
                        attempt = backoff.attempt(),
                        retry_in = ?delay,
                        "Cannot fetch configuration"
                    );
                    continue;
                }
            };

            if last_body.as_deref() == Some(body.as_slice()) {
                tracing::trace!(provider = %self.name, "Configuration unchanged");
                continue;
            }

            let configuration: Configuration = match serde_json::from_slice(&body) {
                Ok(configuration) => configuration,
                Err(e) => {
                    tracing::error!(provider = %self.name, error = %e, "Cannot decode configuration");
                    continue;
                }
            };
            last_body = Some(body);

            tokio::select! {
                _ = stop.stopped() => break,
                sent = send_configuration(&self.out, &self.name, configuration) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::debug!(provider = %self.name, "Poller stopped");
    }

    async fn fetch(&self) -> Result<Vec<u8>, reqwest::Error> {
        let response = self.client.get(self.url.clone()).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}
