#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Fetcher configuration.
///
/// [`FetcherConfig`](config::FetcherConfig) holds the key prefixes, the
/// lifetime of both tiers and the default vary list.
pub mod config;

/// Conversion between responses and stored records.
pub mod entry;

/// Error types for cache operations.
///
/// Defines [`CacheError`], raised by response serialization and by store
/// operations. Fetches never return it.
pub mod error;

/// The [`StaleCacheFetcher`] and its builder.
pub mod fetcher;

/// Metrics collection for cache observability.
///
/// When the `metrics` feature is enabled, this module records:
/// - primary tier hits and misses, stale tier hits
/// - upstream call timing and failures
/// - cache reads and writes that failed without failing the fetch
pub mod metrics;

pub use config::{FetcherConfig, FetcherConfigBuilder};
pub use entry::{deserialize_response, serialize_response};
pub use error::{CacheError, EncodingError};
pub use fetcher::{FetchOptions, FetcherBuilder, NotSet, StaleCacheFetcher};

pub use stalebox_backend::{
    Backend, BackendError, BackendResult, CacheEntry, Format, FormatError, JsonFormat, RonFormat,
    WriteEntry,
};
pub use stalebox_core::{
    BackendLabel, KeyError, KeyPrefixes, Request, RequestInput, RequestOptions, Response,
    ResponseSource, Transport, TransportError, TransportErrorKind,
};

/// The `stalebox` prelude.
///
/// ```rust
/// use stalebox::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{FetchOptions, FetcherConfig, Request, Response, StaleCacheFetcher};
}
