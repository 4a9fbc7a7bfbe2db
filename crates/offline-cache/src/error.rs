//! Cache error types.

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur when using a cache store.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Backend storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize/deserialize cache entry.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored entry could not be turned back into a response.
    #[error("corrupt cache entry {path}: {reason}")]
    Corrupt { path: String, reason: String },
}
