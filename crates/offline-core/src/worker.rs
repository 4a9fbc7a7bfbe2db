//! Worker trait: the install, activate and fetch handlers.

use async_trait::async_trait;

use crate::request::Request;
use crate::response::Response;

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Number of entries written to the cache.
    pub cached: usize,
    /// Supersede the previous instance without waiting for clients to close.
    pub skip_waiting: bool,
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateOutcome {
    /// Cache names removed because they belong to older versions.
    pub deleted: Vec<String>,
    /// Take control of already open pages immediately.
    pub claim_clients: bool,
}

/// Error type for worker lifecycle handlers.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Failed to cache app shell asset {url}: {reason}")]
    Install { url: String, reason: String },

    #[error("Cache error: {0}")]
    Cache(String),
}

/// Handler interface driven by the host.
///
/// `on_fetch` is infallible: every failure must already be converted into a
/// fallback response.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Populate the cache for this version.
    async fn on_install(&self) -> Result<InstallOutcome, WorkerError>;

    /// Remove caches left by older versions.
    async fn on_activate(&self) -> Result<ActivateOutcome, WorkerError>;

    /// Answer a request from a controlled page.
    async fn on_fetch(&self, request: Request) -> Response;
}
