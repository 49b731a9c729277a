//! Transport error type.
//!
//! A [`TransportError`] is the failure signal a [`Transport`](crate::Transport)
//! attaches to a [`Response`](crate::Response). The fetcher never wraps it: when
//! neither the origin nor the stale tier can answer, this exact value is handed
//! back to the caller.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;

/// Category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The exchange completed but the transport's own error policy rejected
    /// the status code (e.g. `error_for_status` on a 5xx).
    Status,
    /// The connection could not be established.
    Connect,
    /// The request did not finish within its timeout.
    Timeout,
    /// The request was cancelled before it completed.
    Cancelled,
    /// Any other failure reported by the transport.
    Other,
}

impl TransportErrorKind {
    /// Returns the kind as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Status => "status",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Cancelled => "cancelled",
            TransportErrorKind::Other => "other",
        }
    }
}

/// Failure reported by a transport for a single exchange.
///
/// Cloning is cheap: the underlying error source is reference counted, so a
/// response carrying an error can be cloned without losing it.
#[derive(Clone)]
pub struct TransportError {
    kind: TransportErrorKind,
    code: Option<StatusCode>,
    message: String,
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl TransportError {
    /// Creates an error of the given kind with a human readable message.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a [`TransportErrorKind::Status`] error for a rejected status code.
    pub fn status(code: StatusCode) -> Self {
        Self {
            kind: TransportErrorKind::Status,
            code: Some(code),
            message: format!("HTTP {code}"),
            source: None,
        }
    }

    /// Creates a [`TransportErrorKind::Cancelled`] error.
    pub fn cancelled() -> Self {
        Self::new(TransportErrorKind::Cancelled, "request cancelled")
    }

    /// Attaches the underlying error that caused this failure.
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Attaches the status code of the failed exchange, if one was received.
    pub fn with_code(mut self, code: StatusCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Returns the failure category.
    #[inline]
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// Returns the status code of the failed exchange, if any.
    #[inline]
    pub fn code(&self) -> Option<StatusCode> {
        self.code
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if the request timed out.
    #[inline]
    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

impl fmt::Debug for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportError")
            .field("kind", &self.kind)
            .field("code", &self.code)
            .field("message", &self.message)
            .field("source", &self.source.as_ref().map(|s| s.to_string()))
            .finish()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport error ({}): {}", self.kind.as_str(), self.message)
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

impl PartialEq for TransportError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.code == other.code && self.message == other.message
    }
}
