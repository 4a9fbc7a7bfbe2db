//! Request classification.

use http::Method;
use offline_core::Request;
use url::Origin;

/// Handling policy for an intercepted request. First match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Top-level document load: network first, shell document fallback.
    Navigation,
    /// Same-origin GET sub-resource: cache first.
    SameOriginAsset,
    /// Cross-origin, or same-origin non-GET: network only, never cached.
    Passthrough,
}

impl RequestClass {
    /// Pick the policy for a request issued from a page of `origin`.
    pub fn classify(request: &Request, origin: &Origin) -> Self {
        if request.is_navigation() {
            Self::Navigation
        } else if *request.method() == Method::GET && request.is_same_origin(origin) {
            Self::SameOriginAsset
        } else {
            Self::Passthrough
        }
    }
}

impl std::fmt::Display for RequestClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Navigation => write!(f, "navigation"),
            Self::SameOriginAsset => write!(f, "same-origin-asset"),
            Self::Passthrough => write!(f, "passthrough"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offline_core::RequestMode;
    use url::Url;

    fn origin() -> Origin {
        Url::parse("https://app.example/").unwrap().origin()
    }

    #[test]
    fn test_navigation_wins() {
        let req = Request::navigate("https://app.example/settings").unwrap();
        assert_eq!(RequestClass::classify(&req, &origin()), RequestClass::Navigation);
    }

    #[test]
    fn test_navigation_post_is_still_navigation() {
        let req = Request::parse(Method::POST, "https://app.example/login")
            .unwrap()
            .with_mode(RequestMode::Navigate);
        assert_eq!(RequestClass::classify(&req, &origin()), RequestClass::Navigation);
    }

    #[test]
    fn test_same_origin_get() {
        let req = Request::get("https://app.example/icons/icon-512.png").unwrap();
        assert_eq!(RequestClass::classify(&req, &origin()), RequestClass::SameOriginAsset);
    }

    #[test]
    fn test_same_origin_post_passes_through() {
        let req = Request::parse(Method::POST, "https://app.example/api/notes").unwrap();
        assert_eq!(RequestClass::classify(&req, &origin()), RequestClass::Passthrough);
    }

    #[test]
    fn test_cross_origin_get_passes_through() {
        let req = Request::get("https://fonts.example/inter.woff2")
            .unwrap()
            .with_mode(RequestMode::NoCors);
        assert_eq!(RequestClass::classify(&req, &origin()), RequestClass::Passthrough);
    }

    #[test]
    fn test_scheme_change_is_cross_origin() {
        let req = Request::get("http://app.example/app.js").unwrap();
        assert_eq!(RequestClass::classify(&req, &origin()), RequestClass::Passthrough);
    }
}
