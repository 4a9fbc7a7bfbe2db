//! Store abstraction: a set of named caches, each a key-value map of responses.

use async_trait::async_trait;
use offline_core::Response;

use crate::error::CacheResult;
use crate::key::CacheKey;

/// One named cache: at most one response per key.
#[async_trait]
pub trait NamedCache: Send + Sync {
    /// The cache name (a cache version).
    fn name(&self) -> &str;

    /// Get the stored response for a key.
    async fn lookup(&self, key: &CacheKey) -> CacheResult<Option<Response>>;

    /// Store a response, overwriting any previous entry for the key.
    async fn put(&self, key: CacheKey, response: Response) -> CacheResult<()>;

    /// Store several responses.
    ///
    /// Backends that can write a batch under one lock should override this.
    async fn put_all(&self, entries: Vec<(CacheKey, Response)>) -> CacheResult<()> {
        for (key, response) in entries {
            self.put(key, response).await?;
        }
        Ok(())
    }

    /// Delete an entry. Returns whether it existed.
    async fn remove(&self, key: &CacheKey) -> CacheResult<bool>;

    /// All keys currently stored.
    async fn keys(&self) -> CacheResult<Vec<CacheKey>>;

    /// Number of entries.
    async fn len(&self) -> CacheResult<usize> {
        Ok(self.keys().await?.len())
    }
}

/// The set of named caches available to a worker.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Handle type for a single cache.
    type Cache: NamedCache;

    /// Open a cache, creating it if absent.
    async fn open(&self, name: &str) -> CacheResult<Self::Cache>;

    /// Open a cache only if it already exists.
    async fn open_existing(&self, name: &str) -> CacheResult<Option<Self::Cache>>;

    /// Whether a cache with this name exists.
    async fn has(&self, name: &str) -> CacheResult<bool>;

    /// Delete a cache and all its entries. Returns whether it existed.
    async fn delete(&self, name: &str) -> CacheResult<bool>;

    /// Names of all existing caches.
    async fn names(&self) -> CacheResult<Vec<String>>;
}
