//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs, main.rs):
//!     Load static config → Init logging → Register providers → Launch aggregator
//!
//! Run (pool.rs):
//!     Provider feeds and helpers run as pool tasks
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → Pool::stop → stop signal fans out → tasks drain → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then providers, then consumer
//! - Stop is observable by tasks subscribed after the trigger
//! - Panicking tasks are contained by the pool

pub mod pool;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use pool::Pool;
pub use shutdown::{Shutdown, StopSignal};
