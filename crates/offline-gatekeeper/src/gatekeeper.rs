//! The offline cache gatekeeper worker.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{join_all, try_join_all};
use http::Method;
use offline_cache::{CacheKey, CacheStatus, CacheStorage, NamedCache};
use offline_core::{
    ActivateOutcome, ConfigError, GatekeeperConfig, InstallOutcome, Request, Response, Worker,
    WorkerError,
};
use offline_fetch::{FetchError, Network};
use offline_observability::GatekeeperMetrics;
use tracing::{debug, debug_span, info, warn, Instrument};
use url::{Origin, Url};

use crate::classify::RequestClass;
use crate::fallback::{self, Fallback};

/// Request interceptor backed by one versioned cache.
///
/// - Install caches the app shell atomically: every asset or none.
/// - Activate deletes every cache whose name is not the current version.
/// - Fetch applies the policy chosen by [`RequestClass`]; it never fails.
pub struct OfflineGatekeeper<S, N> {
    config: GatekeeperConfig,
    storage: S,
    network: N,
    metrics: Arc<GatekeeperMetrics>,
    origin: Origin,
    shell_assets: Vec<Url>,
    shell_url: Url,
    shell_key: CacheKey,
}

impl<S: CacheStorage, N: Network> OfflineGatekeeper<S, N> {
    /// Create a gatekeeper for one deployment.
    pub fn new(config: GatekeeperConfig, storage: S, network: N) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut seen = HashSet::new();
        let shell_assets = config
            .app_shell
            .resolve(&config.scope)?
            .into_iter()
            .filter(|url| seen.insert(CacheKey::get(url)))
            .collect();
        let shell_url = config.shell_document_url()?;
        let shell_key = CacheKey::get(&shell_url);

        Ok(Self {
            origin: config.scope.origin(),
            config,
            storage,
            network,
            metrics: Arc::new(GatekeeperMetrics::new()),
            shell_assets,
            shell_url,
            shell_key,
        })
    }

    /// Share an existing metrics registry.
    pub fn with_metrics(mut self, metrics: Arc<GatekeeperMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &GatekeeperConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn metrics(&self) -> &Arc<GatekeeperMetrics> {
        &self.metrics
    }

    /// Resolved app shell URLs, duplicates removed.
    pub fn shell_assets(&self) -> &[Url] {
        &self.shell_assets
    }

    /// Cache key of the navigation document.
    pub fn shell_key(&self) -> &CacheKey {
        &self.shell_key
    }

    /// Pick the handling policy for a request.
    pub fn classify(&self, request: &Request) -> RequestClass {
        RequestClass::classify(request, &self.origin)
    }

    /// Whether `url` names the navigation document: the scope root or the
    /// shell document itself. Only the navigation policy writes this entry.
    pub fn is_shell_document(&self, url: &Url) -> bool {
        url.origin() == self.origin
            && (url.path() == self.config.scope.path() || url.path() == self.shell_url.path())
    }

    fn version(&self) -> &str {
        self.config.cache_version.as_str()
    }

    async fn fetch_network(&self, request: &Request) -> Result<Response, FetchError> {
        self.metrics.record_network_fetch();
        let result = self.network.fetch(request).await;
        if result.is_err() {
            self.metrics.record_network_failure();
        }
        result
    }

    /// Cache read; store failures count as a miss.
    ///
    /// Never creates the cache: a purged version stays purged even when a
    /// fetch from the retired worker is still in flight.
    async fn lookup(&self, key: &CacheKey) -> (Option<Response>, CacheStatus) {
        let result = match self.storage.open_existing(self.version()).await {
            Ok(Some(cache)) => cache.lookup(key).await,
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };

        match result {
            Ok(Some(response)) => {
                self.metrics.record_cache_hit();
                (Some(response), CacheStatus::Hit)
            }
            Ok(None) => {
                self.metrics.record_cache_miss();
                (None, CacheStatus::Miss)
            }
            Err(error) => {
                self.metrics.record_cache_error();
                warn!(key = %key, error = %error, "Cache lookup failed, treating as miss");
                (None, CacheStatus::Error)
            }
        }
    }

    /// Cache write; failures are logged and dropped. Skipped when the
    /// current version's cache no longer exists.
    async fn store(&self, key: CacheKey, response: Response) {
        let result = match self.storage.open_existing(self.version()).await {
            Ok(Some(cache)) => cache.put(key.clone(), response).await.map(|()| true),
            Ok(None) => Ok(false),
            Err(e) => Err(e),
        };

        match result {
            Ok(false) => {
                debug!(key = %key, version = %self.version(), "Cache gone, write skipped");
            }
            Ok(true) => {
                self.metrics.record_cache_write();
                debug!(key = %key, "Cached response");
            }
            Err(error) => {
                self.metrics.record_cache_error();
                warn!(key = %key, error = %error, "Cache write failed");
            }
        }
    }

    fn fall_back(&self, fallback: Fallback, response: Response) -> Response {
        fallback.record(&self.metrics);
        debug!(fallback = %fallback, status = response.status().as_u16(), "Serving fallback");
        response
    }

    async fn handle_navigation(&self, request: Request) -> Response {
        match self.fetch_network(&request).await {
            Ok(response) => {
                if response.is_success() && self.is_shell_document(request.url()) {
                    self.store(self.shell_key.clone(), response.to_unredirected())
                        .await;
                }
                response
            }
            Err(error) => {
                warn!(error = %error, "Navigation failed, serving offline shell");
                match self.lookup(&self.shell_key).await {
                    (Some(shell), _) => self.fall_back(Fallback::CachedShell, shell),
                    (None, _) => self.fall_back(
                        Fallback::OfflinePage,
                        fallback::offline_page(&self.config.offline_page),
                    ),
                }
            }
        }
    }

    async fn handle_asset(&self, request: Request) -> Response {
        let key = CacheKey::from_request(&request);

        let (cached, status) = self.lookup(&key).await;
        debug!(cache = %status, "Cache lookup");
        if let Some(response) = cached {
            return response;
        }

        match self.fetch_network(&request).await {
            Ok(response) => {
                if response.is_success() && !self.is_shell_document(request.url()) {
                    self.store(key, response.clone()).await;
                }
                response
            }
            Err(error) => {
                warn!(error = %error, "Asset fetch failed with no cached copy");
                self.fall_back(Fallback::GatewayTimeout, fallback::gateway_timeout())
            }
        }
    }

    async fn handle_passthrough(&self, request: Request) -> Response {
        debug!(cache = %CacheStatus::Bypass, "Cache lookup");
        match self.fetch_network(&request).await {
            Ok(response) => response,
            Err(error) => {
                warn!(error = %error, "Passthrough fetch failed");
                self.fall_back(Fallback::NoContent, fallback::no_content())
            }
        }
    }

    async fn fetch_shell_asset(&self, url: &Url) -> Result<(CacheKey, Response), WorkerError> {
        let request = Request::new(Method::GET, url.clone());

        let response = self
            .fetch_network(&request)
            .await
            .map_err(|e| WorkerError::Install {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(WorkerError::Install {
                url: url.to_string(),
                reason: format!("status {}", response.status()),
            });
        }

        Ok((CacheKey::get(url), response.to_unredirected()))
    }
}

#[async_trait]
impl<S, N> Worker for OfflineGatekeeper<S, N>
where
    S: CacheStorage,
    N: Network,
{
    async fn on_install(&self) -> Result<InstallOutcome, WorkerError> {
        let cache = self
            .storage
            .open(self.version())
            .await
            .map_err(|e| WorkerError::Cache(e.to_string()))?;

        // Nothing is written unless every asset was fetched.
        let entries = try_join_all(self.shell_assets.iter().map(|url| self.fetch_shell_asset(url)))
            .await
            .inspect_err(|e| warn!(version = %self.version(), error = %e, "Install failed"))?;

        let cached = entries.len();
        cache
            .put_all(entries)
            .await
            .map_err(|e| WorkerError::Cache(e.to_string()))?;
        for _ in 0..cached {
            self.metrics.record_cache_write();
        }

        info!(version = %self.version(), cached, "App shell cached");
        Ok(InstallOutcome {
            cached,
            skip_waiting: true,
        })
    }

    async fn on_activate(&self) -> Result<ActivateOutcome, WorkerError> {
        let stale: Vec<String> = self
            .storage
            .names()
            .await
            .map_err(|e| WorkerError::Cache(e.to_string()))?
            .into_iter()
            .filter(|name| name != self.version())
            .collect();

        let results = join_all(stale.iter().map(|name| self.storage.delete(name))).await;

        let mut deleted = Vec::new();
        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(true) => deleted.push(name),
                Ok(false) => {}
                Err(error) => warn!(cache = %name, error = %error, "Failed to delete stale cache"),
            }
        }

        info!(version = %self.version(), deleted = ?deleted, "Stale caches removed");
        Ok(ActivateOutcome {
            deleted,
            claim_clients: true,
        })
    }

    async fn on_fetch(&self, request: Request) -> Response {
        let class = self.classify(&request);
        let span = debug_span!(
            "fetch",
            request_id = %request.id(),
            method = %request.method(),
            url = %request.url(),
            class = %class,
        );

        async move {
            match class {
                RequestClass::Navigation => self.handle_navigation(request).await,
                RequestClass::SameOriginAsset => self.handle_asset(request).await,
                RequestClass::Passthrough => self.handle_passthrough(request).await,
            }
        }
        .instrument(span)
        .await
    }
}
