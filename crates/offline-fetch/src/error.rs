//! Network error types.

/// Error type for fetch operations.
///
/// Callers treat every variant the same way: the network is unavailable.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Connection error for {url}: {reason}")]
    Connection { url: String, reason: String },

    #[error("Timeout fetching {0}")]
    Timeout(String),

    #[error("Failed to read body of {url}: {reason}")]
    Body { url: String, reason: String },

    #[error("Request error: {0}")]
    Request(String),

    #[error("Network offline")]
    Offline,
}
