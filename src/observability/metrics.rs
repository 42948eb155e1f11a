//! Metrics collection and exposition.
//!
//! # Metrics
//! - `provider_messages_total` (counter): snapshots accepted, by provider
//! - `provider_failures_total` (counter): init/provide failures, by provider and stage
//! - `configuration_skipped_total` (counter): duplicate snapshots dropped, by provider
//! - `ring_overwrites_total` (counter): values discarded by ring channel coalescing
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until a
//!   recorder is installed
//! - Prometheus exposition is opt-in via `observability.metrics_enabled`

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_message(provider: &str) {
    counter!("provider_messages_total", "provider" => provider.to_string()).increment(1);
}

pub fn record_provider_failure(provider: &str, stage: &'static str) {
    counter!(
        "provider_failures_total",
        "provider" => provider.to_string(),
        "stage" => stage
    )
    .increment(1);
}

pub fn record_configuration_skipped(provider: &str) {
    counter!("configuration_skipped_total", "provider" => provider.to_string()).increment(1);
}

pub fn record_ring_overwrite() {
    counter!("ring_overwrites_total").increment(1);
}
