//! Cache key composition.

use http::Method;
use offline_core::Request;
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::CacheError;

/// Identity of a cached response: method and URL.
///
/// Headers never take part in the key and the URL fragment is dropped, so two
/// requests that differ only in those map to the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    method: Method,
    url: String,
}

impl CacheKey {
    /// Create a cache key.
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method,
            url: url.into(),
        }
    }

    /// Key for a GET of the given URL.
    pub fn get(url: &Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Key for an intercepted request.
    pub fn from_request(request: &Request) -> Self {
        Self::new(request.method().clone(), request.url())
    }

    /// Rebuild a key from its stored parts.
    pub fn parse(method: &str, url: &str) -> Result<Self, CacheError> {
        let method = Method::from_bytes(method.as_bytes()).map_err(|e| CacheError::Corrupt {
            path: url.to_string(),
            reason: format!("bad method '{}': {}", method, e),
        })?;
        let url = Url::parse(url).map_err(|e| CacheError::Corrupt {
            path: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(method, &url))
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// URL without fragment.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stable hex digest, usable as a file name.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.method.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(self.url.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_key_ignores_headers() {
        let plain = Request::get("https://app.example/app.css").unwrap();
        let with_header = Request::get("https://app.example/app.css")
            .unwrap()
            .with_header("Accept", "text/css")
            .unwrap();

        assert_eq!(CacheKey::from_request(&plain), CacheKey::from_request(&with_header));
    }

    #[test]
    fn test_key_drops_fragment() {
        let a = CacheKey::get(&url("https://app.example/index.html#top"));
        let b = CacheKey::get(&url("https://app.example/index.html"));

        assert_eq!(a, b);
        assert_eq!(a.url(), "https://app.example/index.html");
    }

    #[test]
    fn test_key_distinguishes_method() {
        let get = CacheKey::new(Method::GET, &url("https://app.example/api"));
        let post = CacheKey::new(Method::POST, &url("https://app.example/api"));

        assert_ne!(get, post);
        assert_ne!(get.digest(), post.digest());
    }

    #[test]
    fn test_key_keeps_query() {
        let a = CacheKey::get(&url("https://app.example/app.js?v=1"));
        let b = CacheKey::get(&url("https://app.example/app.js?v=2"));

        assert_ne!(a, b);
    }

    #[test]
    fn test_key_digest_format() {
        let digest = CacheKey::get(&url("https://app.example/")).digest();

        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_parse() {
        let key = CacheKey::parse("GET", "https://app.example/manifest.json").unwrap();

        assert_eq!(key.method(), &Method::GET);
        assert_eq!(key.to_string(), "GET https://app.example/manifest.json");
    }

    #[test]
    fn test_key_parse_bad_url() {
        assert!(matches!(
            CacheKey::parse("GET", "::nope::"),
            Err(CacheError::Corrupt { .. })
        ));
    }
}
