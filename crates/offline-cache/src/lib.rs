//! Versioned response caches for the offline app-shell gatekeeper.
//!
//! This crate provides:
//! - `CacheKey` - Request identity (method + URL, headers ignored)
//! - `CacheStorage` / `NamedCache` - The injected store abstraction
//! - `MemoryCacheStorage` - Process-local store for tests and embedding
//! - `DiskCacheStorage` - Persistent store, one directory per cache
//!
//! # Example
//!
//! ```ignore
//! use offline_cache::{CacheKey, CacheStorage, MemoryCacheStorage, NamedCache};
//!
//! let storage = MemoryCacheStorage::new();
//! let cache = storage.open("v1.0.0").await?;
//! cache.put(CacheKey::from_request(&request), response).await?;
//!
//! for stale in storage.names().await? {
//!     if stale != "v1.0.0" {
//!         storage.delete(&stale).await?;
//!     }
//! }
//! ```

mod disk;
mod error;
mod key;
mod memory;
mod status;
mod store;

pub use disk::*;
pub use error::*;
pub use key::*;
pub use memory::*;
pub use status::*;
pub use store::*;
