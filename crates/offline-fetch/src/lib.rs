//! Network boundary for the offline app-shell gatekeeper.
//!
//! This crate provides:
//! - `Network` - The injected fetch abstraction
//! - `HttpNetwork` - `reqwest` transport
//! - `StubNetwork` - In-memory routes with an online switch and call counter

mod client;
mod error;
mod network;
mod stub;

pub use client::*;
pub use error::*;
pub use network::*;
pub use stub::*;
