//! Intercepted request model.

use std::sync::atomic::{AtomicU64, Ordering};

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use url::{Origin, Url};

/// Error type for request construction.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid header '{0}'")]
    InvalidHeader(String),
}

/// Unique request identifier for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Generate the next request ID for this process.
    pub fn generate() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{:06}", self.0)
    }
}

/// How the page issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level document load.
    Navigate,
    /// Same-origin only sub-resource.
    SameOrigin,
    /// Opaque cross-origin sub-resource.
    NoCors,
    /// Regular sub-resource fetch.
    #[default]
    Cors,
}

impl RequestMode {
    /// Whether this mode loads a top-level document.
    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::Navigate)
    }
}

impl std::fmt::Display for RequestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Navigate => write!(f, "navigate"),
            Self::SameOrigin => write!(f, "same-origin"),
            Self::NoCors => write!(f, "no-cors"),
            Self::Cors => write!(f, "cors"),
        }
    }
}

/// A request intercepted from a controlled page.
#[derive(Debug, Clone)]
pub struct Request {
    id: RequestId,
    method: Method,
    url: Url,
    mode: RequestMode,
    headers: HeaderMap,
}

impl Request {
    /// Create a new request.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            id: RequestId::generate(),
            method,
            url,
            mode: RequestMode::default(),
            headers: HeaderMap::new(),
        }
    }

    /// Parse a URL and create a request for it.
    pub fn parse(method: Method, url: &str) -> Result<Self, RequestError> {
        let parsed = Url::parse(url).map_err(|source| RequestError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(Self::new(method, parsed))
    }

    /// Create a GET sub-resource request.
    pub fn get(url: &str) -> Result<Self, RequestError> {
        Self::parse(Method::GET, url)
    }

    /// Create a top-level navigation request.
    pub fn navigate(url: &str) -> Result<Self, RequestError> {
        Ok(Self::get(url)?.with_mode(RequestMode::Navigate))
    }

    /// Set the request mode.
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, RequestError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| RequestError::InvalidHeader(name.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| RequestError::InvalidHeader(name.to_string()))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Request identifier.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request mode.
    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// URL path component.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Origin of the target URL.
    pub fn origin(&self) -> Origin {
        self.url.origin()
    }

    /// Whether this is a top-level document load.
    pub fn is_navigation(&self) -> bool {
        self.mode.is_navigation()
    }

    /// Whether the target shares the given origin.
    pub fn is_same_origin(&self, origin: &Origin) -> bool {
        &self.url.origin() == origin
    }
}
