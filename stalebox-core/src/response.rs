//! Response type returned by transports and by the fetcher.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::error::TransportError;
use crate::request::Request;

/// Where a response returned by the fetcher came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseSource {
    /// Fetched from the origin through the transport.
    #[default]
    Upstream,
    /// Read from the short-lived primary cache tier.
    Primary,
    /// Read from the long-lived stale cache tier after an origin failure.
    Stale,
}

impl ResponseSource {
    /// Returns the source as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Upstream => "upstream",
            ResponseSource::Primary => "primary",
            ResponseSource::Stale => "stale",
        }
    }
}

/// An HTTP response paired with the request that produced it.
///
/// `error` is set exactly when the exchange failed at the transport level.
/// A response with a 5xx status and no `error` is a successful fetch from the
/// cache's point of view.
#[derive(Debug, Clone)]
pub struct Response {
    code: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    request: Request,
    error: Option<TransportError>,
    source: ResponseSource,
}

impl Response {
    /// Creates a successful upstream response.
    pub fn new(request: Request, code: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            code,
            headers,
            body,
            request,
            error: None,
            source: ResponseSource::Upstream,
        }
    }

    /// Creates a failed upstream response that carries only the error.
    ///
    /// The status code is taken from the error when it has one, otherwise it
    /// is `599`, the conventional code for "no response received".
    pub fn failed(request: Request, error: TransportError) -> Self {
        let code = error.code().unwrap_or_else(network_error);
        Self {
            code,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            request,
            error: Some(error),
            source: ResponseSource::Upstream,
        }
    }

    /// Attaches a transport error to an otherwise complete response.
    pub fn with_error(mut self, error: TransportError) -> Self {
        self.error = Some(error);
        self
    }

    /// Marks where this response was served from.
    pub fn with_source(mut self, source: ResponseSource) -> Self {
        self.source = source;
        self
    }

    /// Returns the status code.
    #[inline]
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// Returns the response headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the response body.
    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the request this response answers.
    #[inline]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the transport error, if the exchange failed.
    #[inline]
    pub fn error(&self) -> Option<&TransportError> {
        self.error.as_ref()
    }

    /// Returns true if the transport reported a failure.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Returns where the response was served from.
    #[inline]
    pub fn source(&self) -> ResponseSource {
        self.source
    }

    /// Returns the stored transport error, or the response itself if there is none.
    pub fn rethrow(self) -> Result<Self, TransportError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }

    /// Borrows the cacheable content: status code, headers and body.
    ///
    /// A response read back from either cache tier has the same content as
    /// the response that was written, while its request, error and source
    /// may differ.
    pub fn content(&self) -> (StatusCode, &HeaderMap, &Bytes) {
        (self.code, &self.headers, &self.body)
    }

    /// Splits the response into status code, headers and body.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.code, self.headers, self.body)
    }
}

fn network_error() -> StatusCode {
    StatusCode::from_u16(599).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
