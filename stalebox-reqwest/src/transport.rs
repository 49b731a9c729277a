//! Transport over reqwest-middleware's client.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use reqwest_middleware::ClientWithMiddleware;
use stalebox_core::{Request, Response, Transport, TransportError, TransportErrorKind};
use tracing::trace;

/// [`Transport`] that sends requests with a reqwest client.
///
/// The whole response body is buffered before the response is returned.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ClientWithMiddleware,
    error_for_status: bool,
}

impl ReqwestTransport {
    /// Creates a transport from a plain or middleware-wrapped client.
    pub fn new(client: impl Into<ClientWithMiddleware>) -> Self {
        Self {
            client: client.into(),
            error_for_status: true,
        }
    }

    /// Sets whether `4xx` and `5xx` statuses are reported as failures.
    ///
    /// # Default
    ///
    /// `true`
    pub fn error_for_status(mut self, enabled: bool) -> Self {
        self.error_for_status = enabled;
        self
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &ClientWithMiddleware {
        &self.client
    }

    async fn send(&self, request: &Request) -> Result<(StatusCode, HeaderMap, Bytes), TransportError> {
        let mut builder = self
            .client
            .request(request.method(), request.url())
            .headers(request.headers().clone());
        if !request.body().is_empty() {
            builder = builder.body(request.body().clone());
        }
        if let Some(timeout) = request.timeout() {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(middleware_error)?;
        let code = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(reqwest_error)?;
        Ok((code, headers, body))
    }
}

impl From<reqwest::Client> for ReqwestTransport {
    fn from(client: reqwest::Client) -> Self {
        Self::new(client)
    }
}

impl From<ClientWithMiddleware> for ReqwestTransport {
    fn from(client: ClientWithMiddleware) -> Self {
        Self::new(client)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, request: Request) -> Response {
        trace!(method = %request.method(), url = request.url(), "Sending request");
        match self.send(&request).await {
            Ok((code, headers, body)) => {
                let response = Response::new(request, code, headers, body);
                if self.error_for_status && (code.is_client_error() || code.is_server_error()) {
                    response.with_error(TransportError::status(code))
                } else {
                    response
                }
            }
            Err(error) => Response::failed(request, error),
        }
    }
}

fn reqwest_error(error: reqwest::Error) -> TransportError {
    let kind = if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if error.is_connect() {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Other
    };
    let mut transport = TransportError::new(kind, error.to_string());
    if let Some(code) = error.status() {
        transport = transport.with_code(code);
    }
    transport.with_source(error)
}

fn middleware_error(error: reqwest_middleware::Error) -> TransportError {
    match error {
        reqwest_middleware::Error::Reqwest(error) => reqwest_error(error),
        reqwest_middleware::Error::Middleware(error) => {
            TransportError::new(TransportErrorKind::Other, format!("{error:#}"))
        }
    }
}
