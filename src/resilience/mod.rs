//! Resilience helpers for providers talking to remote sources.
//!
//! The aggregator never retries on a provider's behalf: a provider that polls
//! a remote endpoint owns its retry loop and paces it with backoff.rs.

pub mod backoff;

pub use backoff::Backoff;
