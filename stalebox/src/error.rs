//! Errors of the caching layer.
//!
//! None of these errors reach the caller of
//! [`StaleCacheFetcher::fetch`](crate::StaleCacheFetcher::fetch): a read
//! failure is handled as a cache miss and a write failure leaves the fresh
//! response untouched. They surface through logs, metrics and the standalone
//! [`serialize_response`](crate::serialize_response) and
//! [`deserialize_response`](crate::deserialize_response) functions.

use stalebox_backend::{BackendError, FormatError};
use stalebox_core::KeyError;
use thiserror::Error;

/// A response that cannot be represented as a cache record.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// The response body is not UTF-8 text.
    #[error("response body is not valid UTF-8: {0}")]
    Body(#[from] std::str::Utf8Error),

    /// A response header value is not visible ASCII or UTF-8 text.
    #[error("value of header `{name}` is not valid text")]
    HeaderValue {
        /// Header name.
        name: String,
    },
}

/// Error type for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The response cannot be cached.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The store failed a read or a write.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The record codec failed.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A decoded record does not describe a valid HTTP response.
    #[error("malformed cache entry: {0}")]
    MalformedEntry(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Cache keys could not be derived from the request.
    #[error(transparent)]
    Key(#[from] KeyError),
}
