//! Error types for Redis backend operations.
//!
//! All errors convert into [`BackendError`]. Failures to reach the server
//! become [`BackendError::ConnectionError`]; everything else (server replies,
//! type mismatches, bad URLs) becomes [`BackendError::InternalError`].

use redis::RedisError;
use stalebox_backend::BackendError;

/// Error type for Redis backend operations.
///
/// You typically don't handle this error directly. It appears when:
///
/// - Using [`RedisBackendBuilder::build`] with an invalid connection URL
/// - Performing the first cache operation when Redis is unreachable
///   (connection is established lazily)
/// - Performing cache operations when the Redis server returns an error
///
/// # Examples
///
/// ```no_run
/// use stalebox_redis::RedisBackend;
///
/// let result = RedisBackend::builder().server("not-a-valid-url").build();
///
/// match result {
///     Ok(_) => println!("Configured"),
///     Err(e) => println!("Failed: {}", e),
/// }
/// ```
///
/// [`RedisBackendBuilder::build`]: crate::RedisBackendBuilder::build
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying Redis client.
    #[error("Redis backend error: {0}")]
    Redis(#[from] RedisError),
}

impl Error {
    /// Returns true if the server could not be reached.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Error::Redis(error) => {
                error.is_io_error() || error.is_connection_refusal() || error.is_timeout()
            }
        }
    }
}

impl From<Error> for BackendError {
    fn from(error: Error) -> Self {
        if error.is_connection_error() {
            Self::ConnectionError(Box::new(error))
        } else {
            Self::InternalError(Box::new(error))
        }
    }
}
