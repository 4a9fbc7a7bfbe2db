//! Offline cache gatekeeper for an installable web app.
//!
//! This crate provides:
//! - `OfflineGatekeeper` - The `Worker` implementing install, activate and fetch
//! - `RequestClass` - Per-request policy selection
//! - `Fallback` - Synthesized responses for failed fetches
//! - `WorkerHost` - Drives a worker through its lifecycle and routes fetches
//!
//! # Example
//!
//! ```ignore
//! use offline_cache::MemoryCacheStorage;
//! use offline_core::{GatekeeperConfig, Request};
//! use offline_fetch::{HttpNetwork, NetworkConfig};
//! use offline_gatekeeper::{OfflineGatekeeper, WorkerHost};
//!
//! let config = GatekeeperConfig::load("gatekeeper.toml")?;
//! let network = HttpNetwork::new(NetworkConfig::default())?;
//! let gatekeeper = OfflineGatekeeper::new(config, MemoryCacheStorage::new(), network)?;
//!
//! let host = WorkerHost::new(gatekeeper);
//! host.start().await?;
//!
//! if let Some(response) = host.dispatch_fetch(Request::navigate("https://app.example/")?).await {
//!     // serve response
//! }
//! ```

mod classify;
mod fallback;
mod gatekeeper;
mod host;

pub use classify::*;
pub use fallback::*;
pub use gatekeeper::*;
pub use host::*;
