//! In-memory cache storage (for development/testing and embedding).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use offline_core::Response;
use tokio::sync::RwLock;

use crate::error::CacheResult;
use crate::key::CacheKey;
use crate::store::{CacheStorage, NamedCache};

type Entries = Arc<RwLock<HashMap<CacheKey, Response>>>;

/// Process-local cache storage.
///
/// Clones share the same caches. A handle returned by `open` stays usable
/// after its cache is deleted, but is detached from the storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStorage {
    caches: Arc<RwLock<BTreeMap<String, Entries>>>,
}

impl MemoryCacheStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    type Cache = MemoryCache;

    async fn open(&self, name: &str) -> CacheResult<MemoryCache> {
        let mut caches = self.caches.write().await;
        let entries = caches.entry(name.to_string()).or_default().clone();
        Ok(MemoryCache {
            name: name.to_string(),
            entries,
        })
    }

    async fn open_existing(&self, name: &str) -> CacheResult<Option<MemoryCache>> {
        Ok(self.caches.read().await.get(name).map(|entries| MemoryCache {
            name: name.to_string(),
            entries: entries.clone(),
        }))
    }

    async fn has(&self, name: &str) -> CacheResult<bool> {
        Ok(self.caches.read().await.contains_key(name))
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        Ok(self.caches.write().await.remove(name).is_some())
    }

    async fn names(&self) -> CacheResult<Vec<String>> {
        Ok(self.caches.read().await.keys().cloned().collect())
    }
}

/// Handle to one in-memory cache.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    name: String,
    entries: Entries,
}

#[async_trait]
impl NamedCache for MemoryCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, key: &CacheKey) -> CacheResult<Option<Response>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: CacheKey, response: Response) -> CacheResult<()> {
        self.entries.write().await.insert(key, response);
        Ok(())
    }

    async fn put_all(&self, entries: Vec<(CacheKey, Response)>) -> CacheResult<()> {
        let mut map = self.entries.write().await;
        map.extend(entries);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> CacheResult<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn keys(&self) -> CacheResult<Vec<CacheKey>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn len(&self) -> CacheResult<usize> {
        Ok(self.entries.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn key(path: &str) -> CacheKey {
        CacheKey::get(&Url::parse("https://app.example/").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_open_creates_cache() {
        let storage = MemoryCacheStorage::new();
        assert!(!storage.has("v1").await.unwrap());

        storage.open("v1").await.unwrap();

        assert!(storage.has("v1").await.unwrap());
        assert_eq!(storage.names().await.unwrap(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_open_existing_does_not_create() {
        let storage = MemoryCacheStorage::new();
        assert!(storage.open_existing("v1").await.unwrap().is_none());
        assert!(storage.names().await.unwrap().is_empty());

        storage
            .open("v1")
            .await
            .unwrap()
            .put(key("app.js"), Response::ok("js"))
            .await
            .unwrap();

        let cache = storage.open_existing("v1").await.unwrap().unwrap();
        assert_eq!(cache.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_then_lookup() {
        let storage = MemoryCacheStorage::new();
        let cache = storage.open("v1").await.unwrap();

        cache.put(key("app.css"), Response::ok("body{}")).await.unwrap();

        let hit = cache.lookup(&key("app.css")).await.unwrap().unwrap();
        assert_eq!(hit.text(), "body{}");
        assert!(cache.lookup(&key("other.css")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let storage = MemoryCacheStorage::new();
        let cache = storage.open("v1").await.unwrap();

        cache.put(key("app.js"), Response::ok("one")).await.unwrap();
        cache.put(key("app.js"), Response::ok("two")).await.unwrap();

        assert_eq!(cache.len().await.unwrap(), 1);
        assert_eq!(cache.lookup(&key("app.js")).await.unwrap().unwrap().text(), "two");
    }

    #[tokio::test]
    async fn test_handles_share_entries() {
        let storage = MemoryCacheStorage::new();
        let first = storage.open("v1").await.unwrap();
        let second = storage.open("v1").await.unwrap();

        first.put(key("a"), Response::ok("a")).await.unwrap();

        assert!(second.lookup(&key("a")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_cache() {
        let storage = MemoryCacheStorage::new();
        let cache = storage.open("v1").await.unwrap();
        cache.put(key("a"), Response::ok("a")).await.unwrap();

        assert!(storage.delete("v1").await.unwrap());
        assert!(!storage.delete("v1").await.unwrap());

        let reopened = storage.open("v1").await.unwrap();
        assert_eq!(reopened.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_put_all_and_remove() {
        let storage = MemoryCacheStorage::new();
        let cache = storage.open("v1").await.unwrap();

        cache
            .put_all(vec![
                (key("a"), Response::ok("a")),
                (key("b"), Response::ok("b")),
            ])
            .await
            .unwrap();
        assert_eq!(cache.len().await.unwrap(), 2);

        assert!(cache.remove(&key("a")).await.unwrap());
        assert!(!cache.remove(&key("a")).await.unwrap());
        assert_eq!(cache.keys().await.unwrap(), vec![key("b")]);
    }
}
