//! Observability infrastructure for the offline app-shell gatekeeper.
//!
//! This crate provides:
//! - `init_tracing` - `tracing-subscriber` setup (JSON or human output)
//! - `GatekeeperMetrics` - Counters for cache and network outcomes

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;
