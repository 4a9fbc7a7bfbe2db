//! In-memory network (for development/testing).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use http::StatusCode;
use offline_core::{Request, Response};
use url::Url;

use crate::error::FetchError;
use crate::network::Network;

/// A network that answers from a fixed route table.
///
/// Unknown URLs get an empty 404. While offline, or for URLs registered as
/// failing, every fetch returns an error. Every call is counted, including
/// failed ones.
#[derive(Debug)]
pub struct StubNetwork {
    routes: HashMap<String, Response>,
    failing: HashSet<String>,
    online: AtomicBool,
    calls: AtomicUsize,
}

impl StubNetwork {
    /// Create an online network with no routes.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            failing: HashSet::new(),
            online: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    /// Serve `response` for `url`.
    pub fn with_route(mut self, url: &str, response: Response) -> Self {
        self.routes.insert(route_key(url), response);
        self
    }

    /// Fail every fetch of `url` even while online.
    pub fn with_failing_route(mut self, url: &str) -> Self {
        self.failing.insert(route_key(url));
        self
    }

    /// Switch connectivity.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Whether the network is reachable.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Number of fetches attempted so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Reset the call counter.
    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }
}

impl Default for StubNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.is_online() {
            return Err(FetchError::Offline);
        }

        let key = route_key(request.url().as_str());
        if self.failing.contains(&key) {
            return Err(FetchError::Connection {
                url: key,
                reason: "connection reset".to_string(),
            });
        }

        Ok(self
            .routes
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Response::new(StatusCode::NOT_FOUND)))
    }
}

// Normalise through `Url` so "https://a.example" and "https://a.example/" match.
fn route_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => url.to_string(),
    }
}
