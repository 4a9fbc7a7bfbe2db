//! Fallback responses for failed fetches.

use http::StatusCode;
use offline_core::Response;
use offline_observability::GatekeeperMetrics;

/// Which fallback answered a request whose network fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Navigation answered with the cached shell document.
    CachedShell,
    /// Navigation answered with the synthesized offline page.
    OfflinePage,
    /// Same-origin asset with no cache entry: empty 504.
    GatewayTimeout,
    /// Cross-origin or non-GET request: empty 204.
    NoContent,
}

impl Fallback {
    /// Count this fallback.
    pub fn record(&self, metrics: &GatekeeperMetrics) {
        match self {
            Self::CachedShell => metrics.record_shell_fallback(),
            Self::OfflinePage => metrics.record_offline_page(),
            Self::GatewayTimeout => metrics.record_gateway_timeout(),
            Self::NoContent => metrics.record_no_content(),
        }
    }
}

impl std::fmt::Display for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CachedShell => write!(f, "cached-shell"),
            Self::OfflinePage => write!(f, "offline-page"),
            Self::GatewayTimeout => write!(f, "gateway-timeout"),
            Self::NoContent => write!(f, "no-content"),
        }
    }
}

/// Minimal HTML page served when offline with no cached shell.
pub fn offline_page(html: &str) -> Response {
    Response::html(html.to_string())
}

/// Empty 504 for an uncached same-origin asset.
pub fn gateway_timeout() -> Response {
    Response::new(StatusCode::GATEWAY_TIMEOUT)
}

/// Empty 204 for a failed cross-origin or non-GET request.
pub fn no_content() -> Response {
    Response::new(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_page() {
        let resp = offline_page("<h1>Offline</h1>");

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.content_type(), Some("text/html"));
        assert_eq!(resp.text(), "<h1>Offline</h1>");
    }

    #[test]
    fn test_gateway_timeout_is_empty() {
        let resp = gateway_timeout();

        assert_eq!(resp.status().as_u16(), 504);
        assert!(resp.body().is_empty());
    }

    #[test]
    fn test_no_content_is_empty() {
        let resp = no_content();

        assert_eq!(resp.status().as_u16(), 204);
        assert!(resp.body().is_empty());
    }

    #[test]
    fn test_fallback_record() {
        let metrics = GatekeeperMetrics::new();

        Fallback::CachedShell.record(&metrics);
        Fallback::NoContent.record(&metrics);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.shell_fallbacks, 1);
        assert_eq!(snapshot.no_content_fallbacks, 1);
        assert_eq!(snapshot.fallbacks(), 2);
    }
}
