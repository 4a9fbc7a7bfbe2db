//! `reqwest` network transport.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use offline_core::{Request, Response};
use reqwest::Client;

use crate::error::FetchError;
use crate::network::Network;

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// User agent string (default: "offline-shell/0.1").
    pub user_agent: String,
    /// Whole-request timeout. `None` leaves stalled requests pending.
    pub timeout: Option<Duration>,
    /// Maximum number of redirects to follow (default: 20).
    pub max_redirects: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_agent: "offline-shell/0.1".to_string(),
            timeout: None,
            max_redirects: 20,
        }
    }
}

/// Network backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    http: Client,
    config: NetworkConfig,
}

impl HttpNetwork {
    /// Create a new transport with the given configuration.
    pub fn new(config: NetworkConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects));

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| FetchError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let start = Instant::now();
        let url = request.url().as_str().to_string();

        let response = self
            .http
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(url.clone())
                } else {
                    FetchError::Connection {
                        url: url.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let redirected = response.url() != request.url();
        let headers = response.headers().clone();

        let body = response.bytes().await.map_err(|e| FetchError::Body {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            redirected,
            bytes = body.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "Fetched from network"
        );

        Ok(Response::new(status)
            .with_headers(headers)
            .with_body(body)
            .with_redirected(redirected))
    }
}
