//! Persistent cache storage on the local filesystem.
//!
//! Layout: `<root>/<hex(cache name)>/<sha256(key)>.json`. Each entry file
//! holds the key parts and the full response, with the body and header values
//! base64 encoded. Writes go through a temporary file and a rename, so readers
//! never see a partial entry.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use offline_core::Response;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult};
use crate::key::CacheKey;
use crate::store::{CacheStorage, NamedCache};

const ENTRY_EXTENSION: &str = "json";

/// Cache storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct DiskCacheStorage {
    root: PathBuf,
}

impl DiskCacheStorage {
    /// Open (creating if needed) a storage root.
    pub async fn open_root(root: impl Into<PathBuf>) -> CacheResult<Self> {
        let root = root.into();
        if tokio::fs::try_exists(&root).await? && !tokio::fs::metadata(&root).await?.is_dir() {
            return Err(CacheError::Storage(format!(
                "cache root {} is not a directory",
                root.display()
            )));
        }
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// The storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cache_dir(&self, name: &str) -> PathBuf {
        self.root.join(hex::encode(name))
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    type Cache = DiskCache;

    async fn open(&self, name: &str) -> CacheResult<DiskCache> {
        let dir = self.cache_dir(name);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(DiskCache {
            name: name.to_string(),
            dir,
        })
    }

    async fn open_existing(&self, name: &str) -> CacheResult<Option<DiskCache>> {
        let dir = self.cache_dir(name);
        if !tokio::fs::try_exists(&dir).await? {
            return Ok(None);
        }
        Ok(Some(DiskCache {
            name: name.to_string(),
            dir,
        }))
    }

    async fn has(&self, name: &str) -> CacheResult<bool> {
        Ok(tokio::fs::try_exists(self.cache_dir(name)).await?)
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        match tokio::fs::remove_dir_all(self.cache_dir(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn names(&self) -> CacheResult<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;

        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            let decoded = file_name
                .to_str()
                .and_then(|s| hex::decode(s).ok())
                .and_then(|bytes| String::from_utf8(bytes).ok());

            match decoded {
                Some(name) => names.push(name),
                None => warn!(path = %entry.path().display(), "Skipping foreign directory in cache root"),
            }
        }

        names.sort();
        Ok(names)
    }
}

/// Handle to one on-disk cache.
#[derive(Debug, Clone)]
pub struct DiskCache {
    name: String,
    dir: PathBuf,
}

impl DiskCache {
    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.{}", key.digest(), ENTRY_EXTENSION))
    }

    /// Serialize an entry next to its final path. Returns `(temp, final)`.
    async fn write_temp(
        &self,
        key: &CacheKey,
        response: &Response,
    ) -> CacheResult<(PathBuf, PathBuf)> {
        static NEXT_TMP: AtomicU64 = AtomicU64::new(0);

        let path = self.entry_path(key);
        let tmp = self.dir.join(format!(
            "{}.{}.tmp",
            key.digest(),
            NEXT_TMP.fetch_add(1, Ordering::Relaxed)
        ));
        let bytes = serde_json::to_vec(&StoredEntry::capture(key, response))?;

        if let Err(e) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok((tmp, path))
    }

    async fn read_entry(&self, path: &Path) -> CacheResult<Option<StoredEntry>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl NamedCache for DiskCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, key: &CacheKey) -> CacheResult<Option<Response>> {
        let path = self.entry_path(key);
        match self.read_entry(&path).await? {
            Some(entry) => Ok(Some(entry.into_response(&path)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: CacheKey, response: Response) -> CacheResult<()> {
        let (tmp, path) = self.write_temp(&key, &response).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(cache = %self.name, key = %key, "Stored entry on disk");
        Ok(())
    }

    /// All entries are staged as temporary files before any is renamed into
    /// place. On failure the staged files and the entries already renamed
    /// are removed.
    async fn put_all(&self, entries: Vec<(CacheKey, Response)>) -> CacheResult<()> {
        let mut staged = Vec::with_capacity(entries.len());
        for (key, response) in &entries {
            match self.write_temp(key, response).await {
                Ok(paths) => staged.push(paths),
                Err(e) => {
                    discard(staged.iter().map(|(tmp, _)| tmp)).await;
                    return Err(e);
                }
            }
        }

        for (i, (tmp, path)) in staged.iter().enumerate() {
            if let Err(e) = tokio::fs::rename(tmp, path).await {
                warn!(cache = %self.name, error = %e, "Batch write failed, rolling back");
                discard(staged[..i].iter().map(|(_, path)| path)).await;
                discard(staged[i..].iter().map(|(tmp, _)| tmp)).await;
                return Err(e.into());
            }
        }

        debug!(cache = %self.name, entries = entries.len(), "Stored batch on disk");
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> CacheResult<bool> {
        match tokio::fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> CacheResult<Vec<CacheKey>> {
        let mut keys = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            if let Some(stored) = self.read_entry(&path).await? {
                keys.push(CacheKey::parse(&stored.method, &stored.url)?);
            }
        }

        Ok(keys)
    }
}

async fn discard<'a>(paths: impl Iterator<Item = &'a PathBuf>) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove cache file");
        }
    }
}

/// Serialized form of one cache entry.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    method: String,
    url: String,
    status: u16,
    /// Header name and base64 value; values may carry non-UTF-8 bytes.
    headers: Vec<(String, String)>,
    body: String,
    #[serde(default)]
    redirected: bool,
}

impl StoredEntry {
    fn capture(key: &CacheKey, response: &Response) -> Self {
        Self {
            method: key.method().to_string(),
            url: key.url().to_string(),
            status: response.status().as_u16(),
            headers: response
                .headers()
                .iter()
                .map(|(name, value)| (name.as_str().to_string(), BASE64.encode(value.as_bytes())))
                .collect(),
            body: BASE64.encode(response.body()),
            redirected: response.redirected(),
        }
    }

    fn into_response(self, path: &Path) -> CacheResult<Response> {
        let corrupt = |reason: String| CacheError::Corrupt {
            path: path.display().to_string(),
            reason,
        };

        let status = StatusCode::from_u16(self.status)
            .map_err(|e| corrupt(format!("status {}: {}", self.status, e)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| corrupt(format!("header name '{}': {}", name, e)))?;
            let value = BASE64
                .decode(value.as_bytes())
                .map_err(|e| corrupt(format!("header value for '{}': {}", name, e)))
                .and_then(|bytes| {
                    HeaderValue::from_bytes(&bytes)
                        .map_err(|e| corrupt(format!("header value for '{}': {}", name, e)))
                })?;
            headers.append(name, value);
        }

        let body = BASE64
            .decode(self.body.as_bytes())
            .map_err(|e| corrupt(format!("body: {}", e)))?;

        Ok(Response::new(status)
            .with_headers(headers)
            .with_body(body)
            .with_redirected(self.redirected))
    }
}
