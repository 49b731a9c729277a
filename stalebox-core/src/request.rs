//! Outbound request types.
//!
//! - [`Request`] - a fully described HTTP request
//! - [`RequestOptions`] - construction options applied to a bare URL
//! - [`RequestInput`] - either a URL or a prepared request, as accepted by the fetcher
//!
//! ```
//! use stalebox_core::{Request, RequestInput, RequestOptions};
//! use http::Method;
//!
//! let input: RequestInput = "http://example.com/users".into();
//! let request = input.into_request(RequestOptions::new().method(Method::POST));
//! assert_eq!(request.method(), Method::POST);
//!
//! // A prepared request ignores construction options.
//! let input: RequestInput = Request::get("http://example.com/users").into();
//! let request = input.into_request(RequestOptions::new().method(Method::POST));
//! assert_eq!(request.method(), Method::GET);
//! ```

use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;

/// An HTTP request as seen by the fetcher and the transport.
///
/// Headers are kept in a [`HeaderMap`], which preserves insertion order per name
/// and looks names up case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Bytes,
    timeout: Option<Duration>,
}

impl Request {
    /// Creates a `GET` request for the given URL.
    pub fn get(url: impl Into<String>) -> Self {
        Self::builder(url).build()
    }

    /// Starts building a request for the given URL.
    pub fn builder(url: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            request: Request {
                method: Method::GET,
                url: url.into(),
                headers: HeaderMap::new(),
                body: Bytes::new(),
                timeout: None,
            },
        }
    }

    /// Returns the request method.
    #[inline]
    pub fn method(&self) -> Method {
        self.method.clone()
    }

    /// Returns the target URL.
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the request headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request body.
    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the timeout the transport should apply, if any.
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builder for [`Request`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Sets the request method.
    pub fn method(mut self, method: Method) -> Self {
        self.request.method = method;
        self
    }

    /// Appends a header. Repeated names keep every value.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.request.headers.append(name, value);
        self
    }

    /// Replaces all headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.request.headers = headers;
        self
    }

    /// Sets the request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.request.body = body.into();
        self
    }

    /// Sets the transport timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = Some(timeout);
        self
    }

    /// Finishes the request.
    pub fn build(self) -> Request {
        self.request
    }
}

/// Options used to construct a [`Request`] when only a URL is given.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    method: Option<Method>,
    headers: HeaderMap,
    body: Option<Bytes>,
    timeout: Option<Duration>,
}

impl RequestOptions {
    /// Creates empty options (a plain `GET`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Appends a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replaces all headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the transport timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn build(self, url: String) -> Request {
        let mut builder = Request::builder(url).headers(self.headers);
        if let Some(method) = self.method {
            builder = builder.method(method);
        }
        if let Some(body) = self.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

/// Input accepted by the fetcher: a bare URL or a prepared request.
#[derive(Debug, Clone)]
pub enum RequestInput {
    /// A URL; the request is built from [`RequestOptions`].
    Url(String),
    /// A prepared request, used as-is.
    Request(Request),
}

impl RequestInput {
    /// Normalizes the input into a single [`Request`].
    ///
    /// Construction options only apply to [`RequestInput::Url`].
    pub fn into_request(self, options: RequestOptions) -> Request {
        match self {
            RequestInput::Url(url) => options.build(url),
            RequestInput::Request(request) => request,
        }
    }
}

impl From<&str> for RequestInput {
    fn from(url: &str) -> Self {
        RequestInput::Url(url.to_owned())
    }
}

impl From<String> for RequestInput {
    fn from(url: String) -> Self {
        RequestInput::Url(url)
    }
}

impl From<Request> for RequestInput {
    fn from(request: Request) -> Self {
        RequestInput::Request(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::ACCEPT;

    #[test]
    fn url_input_uses_options() {
        let request = RequestInput::from("/url").into_request(
            RequestOptions::new()
                .method(Method::PUT)
                .header(ACCEPT, HeaderValue::from_static("text/xml"))
                .body("payload")
                .timeout(Duration::from_secs(2)),
        );

        assert_eq!(request.url(), "/url");
        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.headers()["accept"], "text/xml");
        assert_eq!(request.body().as_ref(), b"payload");
        assert_eq!(request.timeout(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn url_input_defaults_to_get() {
        let request = RequestInput::from(String::from("/url")).into_request(RequestOptions::new());
        assert_eq!(request, Request::get("/url"));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let request = Request::builder("/url")
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .build();
        assert_eq!(request.headers()["ACCEPT"], "application/json");
    }
}
