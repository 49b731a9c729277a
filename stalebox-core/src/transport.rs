use std::sync::Arc;

use async_trait::async_trait;

use crate::request::Request;
use crate::response::Response;

/// Capability to send a request to the origin.
///
/// Implementations never fail the call itself: a network failure, timeout,
/// cancellation or a status code rejected by the transport's own error policy
/// is reported through [`Response::error`]. Whether that error reaches the
/// caller is decided by the fetcher, not by the transport.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use bytes::Bytes;
/// use http::{HeaderMap, StatusCode};
/// use stalebox_core::{Request, Response, Transport};
///
/// struct Static;
///
/// #[async_trait]
/// impl Transport for Static {
///     async fn fetch(&self, request: Request) -> Response {
///         Response::new(request, StatusCode::OK, HeaderMap::new(), Bytes::from_static(b"hi"))
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the response, with any failure attached to it.
    async fn fetch(&self, request: Request) -> Response;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn fetch(&self, request: Request) -> Response {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl Transport for Box<dyn Transport> {
    async fn fetch(&self, request: Request) -> Response {
        (**self).fetch(request).await
    }
}
