//! Gatekeeper counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Process-wide counters for cache and network outcomes.
///
/// All methods take `&self`; share behind an `Arc`.
#[derive(Debug, Default)]
pub struct GatekeeperMetrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    cache_writes: AtomicU64,
    cache_errors: AtomicU64,
    network_fetches: AtomicU64,
    network_failures: AtomicU64,
    shell_fallbacks: AtomicU64,
    offline_pages: AtomicU64,
    gateway_timeouts: AtomicU64,
    no_content_fallbacks: AtomicU64,
}

impl GatekeeperMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_write(&self) {
        self.cache_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_error(&self) {
        self.cache_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_fetch(&self) {
        self.network_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_failure(&self) {
        self.network_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A navigation was answered with the cached shell document.
    pub fn record_shell_fallback(&self) {
        self.shell_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// A navigation was answered with the synthesized offline page.
    pub fn record_offline_page(&self) {
        self.offline_pages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gateway_timeout(&self) {
        self.gateway_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_no_content(&self) {
        self.no_content_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_writes: self.cache_writes.load(Ordering::Relaxed),
            cache_errors: self.cache_errors.load(Ordering::Relaxed),
            network_fetches: self.network_fetches.load(Ordering::Relaxed),
            network_failures: self.network_failures.load(Ordering::Relaxed),
            shell_fallbacks: self.shell_fallbacks.load(Ordering::Relaxed),
            offline_pages: self.offline_pages.load(Ordering::Relaxed),
            gateway_timeouts: self.gateway_timeouts.load(Ordering::Relaxed),
            no_content_fallbacks: self.no_content_fallbacks.load(Ordering::Relaxed),
        }
    }
}

/// Serializable copy of `GatekeeperMetrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_writes: u64,
    pub cache_errors: u64,
    pub network_fetches: u64,
    pub network_failures: u64,
    pub shell_fallbacks: u64,
    pub offline_pages: u64,
    pub gateway_timeouts: u64,
    pub no_content_fallbacks: u64,
}

impl MetricsSnapshot {
    /// Total synthesized or cached answers given because the network failed.
    pub fn fallbacks(&self) -> u64 {
        self.shell_fallbacks + self.offline_pages + self.gateway_timeouts + self.no_content_fallbacks
    }

    /// Format as JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
