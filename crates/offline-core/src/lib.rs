//! Core abstractions for the offline app-shell gatekeeper.
//!
//! This crate provides the fundamental types and traits:
//! - `GatekeeperConfig` - Cache version, scope and app shell manifest
//! - `Request` / `Response` - The intercepted request model
//! - `Worker` trait - Install, activate and fetch handlers
//! - `WorkerState` - Worker lifecycle tracking

mod config;
mod lifecycle;
mod request;
mod response;
mod worker;

pub use config::*;
pub use lifecycle::*;
pub use request::*;
pub use response::*;
pub use worker::*;
