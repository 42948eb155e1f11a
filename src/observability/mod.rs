//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Providers, aggregator, ring channels, configuration watcher produce:
//!     → logging.rs (structured log events, `provider` field on every lifecycle event)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stdout (text, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
