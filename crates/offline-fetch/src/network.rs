//! The injected network abstraction.

use std::sync::Arc;

use async_trait::async_trait;
use offline_core::{Request, Response};

use crate::error::FetchError;

/// Something that can perform a request over the network.
///
/// HTTP error statuses are successful fetches; only transport failures are
/// errors.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform the request.
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError>;
}

#[async_trait]
impl<N: Network + ?Sized> Network for Arc<N> {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        (**self).fetch(request).await
    }
}
