//! The stale-cache fetcher.

use std::sync::Arc;

use stalebox_backend::{Backend, Format, JsonFormat, WriteEntry, metrics as backend_metrics};
use stalebox_core::{
    KeyError, KeyPrefixes, Request, RequestInput, RequestOptions, Response, ResponseSource,
    Transport, TransportError,
};
use tracing::{Instrument, debug, debug_span, warn};

use crate::config::FetcherConfig;
use crate::entry::{deserialize_response, serialize_response};
use crate::metrics::{self, Timer};

/// Per-call options of [`StaleCacheFetcher::fetch`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Vary list for this call; `None` uses the configured one.
    pub vary: Option<Vec<String>>,
    /// Return the transport error when neither the origin nor the stale tier
    /// can answer. When `false` the failed response is returned instead.
    pub raise_error: bool,
    /// Construction options used when the input is a bare URL.
    pub request: RequestOptions,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            vary: None,
            raise_error: true,
            request: RequestOptions::default(),
        }
    }
}

impl FetchOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the vary list for this call.
    pub fn vary<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vary = Some(headers.into_iter().map(Into::into).collect());
        self
    }

    /// Sets whether an unrecoverable transport error is returned as `Err`.
    pub fn raise_error(mut self, raise_error: bool) -> Self {
        self.raise_error = raise_error;
        self
    }

    /// Sets the construction options for a bare URL input.
    pub fn request(mut self, options: RequestOptions) -> Self {
        self.request = options;
        self
    }
}

/// Caching decorator around a [`Transport`].
///
/// Every successful response is written to two tiers of one [`Backend`] in a
/// single atomic write: a primary tier that answers repeat requests while it
/// is fresh, and a stale tier that answers when the origin fails.
///
/// ```text
/// fetch ─▶ primary hit? ──yes──▶ cached response
///              │ no
///              ▼
///          transport ──ok──▶ write primary + stale ──▶ fresh response
///              │ error
///              ▼
///          stale hit? ──yes──▶ stale response
///              │ no
///              ▼
///          transport error (or the failed response)
/// ```
///
/// Cache failures never fail a fetch. A read that errors or returns an
/// undecodable record counts as a miss, and a write that errors is logged
/// and dropped. The only error a caller can receive is the transport's own.
///
/// Concurrent misses for the same key are not coalesced; each one calls the
/// origin and the last write wins.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// use stalebox::{FetchOptions, FetcherConfig, StaleCacheFetcher};
/// # use stalebox::{Backend, Transport};
/// # async fn run(backend: impl Backend + 'static, transport: impl Transport + 'static) {
///
/// let fetcher = StaleCacheFetcher::builder()
///     .backend(backend)
///     .transport(transport)
///     .config(FetcherConfig::builder().ttl(Duration::from_secs(30)).build())
///     .build();
///
/// let response = fetcher
///     .fetch("http://example.com/users", FetchOptions::new().vary(["Accept"]))
///     .await;
/// # }
/// ```
pub struct StaleCacheFetcher<B, T> {
    backend: Arc<B>,
    transport: Arc<T>,
    config: Arc<FetcherConfig>,
    prefixes: Arc<KeyPrefixes>,
    format: Arc<dyn Format>,
}

impl<B, T> Clone for StaleCacheFetcher<B, T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
            prefixes: Arc::clone(&self.prefixes),
            format: Arc::clone(&self.format),
        }
    }
}

impl<B, T> std::fmt::Debug for StaleCacheFetcher<B, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaleCacheFetcher")
            .field("backend", &"...")
            .field("transport", &"...")
            .field("config", &self.config)
            .field("format", &self.format)
            .finish()
    }
}

/// Marker type for unset builder fields.
///
/// When you see `NotSet` in a compiler error, it means you haven't called
/// the corresponding builder method yet.
pub struct NotSet;

impl StaleCacheFetcher<NotSet, NotSet> {
    /// Creates a new [`FetcherBuilder`].
    pub fn builder() -> FetcherBuilder<NotSet, NotSet> {
        FetcherBuilder::new()
    }
}

impl<B, T> StaleCacheFetcher<B, T>
where
    B: Backend,
    T: Transport,
{
    /// Creates a fetcher with the default JSON record format.
    pub fn new(backend: B, transport: T, config: FetcherConfig) -> Self {
        StaleCacheFetcher::builder()
            .backend(backend)
            .transport(transport)
            .config(config)
            .build()
    }

    /// Fetches a URL or a prepared request through the cache.
    ///
    /// Construction options in `options.request` only apply when `input` is
    /// a URL.
    pub async fn fetch(
        &self,
        input: impl Into<RequestInput>,
        options: FetchOptions,
    ) -> Result<Response, TransportError> {
        let FetchOptions {
            vary,
            raise_error,
            request: request_options,
        } = options;
        let request = input.into().into_request(request_options);
        let span = debug_span!(
            "stalebox.fetch",
            url = %request.url(),
            method = %request.method(),
        );
        let vary = vary.unwrap_or_else(|| self.config.vary.clone());
        self.fetch_request(request, &vary, raise_error)
            .instrument(span)
            .await
    }

    /// Fetches a URL with the default options.
    pub async fn get(&self, url: impl Into<String>) -> Result<Response, TransportError> {
        self.fetch(url.into(), FetchOptions::default()).await
    }

    /// Returns the primary tier key of a request.
    pub fn primary_key<S: AsRef<str>>(
        &self,
        request: &Request,
        vary: &[S],
    ) -> Result<String, KeyError> {
        self.prefixes.primary_key(request, vary)
    }

    /// Returns the stale tier key of a request.
    pub fn stale_key<S: AsRef<str>>(
        &self,
        request: &Request,
        vary: &[S],
    ) -> Result<String, KeyError> {
        self.prefixes.stale_key(request, vary)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Returns the store.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn fetch_request(
        &self,
        request: Request,
        vary: &[String],
        raise_error: bool,
    ) -> Result<Response, TransportError> {
        let (primary_key, stale_key) = match self.prefixes.keys(&request, vary) {
            Ok(keys) => keys,
            Err(error) => {
                warn!(%error, "Cache key derivation failed, bypassing cache");
                let response = self.call_upstream(request).await;
                return finish(response, raise_error);
            }
        };

        if let Some(response) = self
            .read(&primary_key, &request, ResponseSource::Primary)
            .await
        {
            metrics::record_primary_hit();
            return Ok(response);
        }
        metrics::record_primary_miss();

        let response = self.call_upstream(request.clone()).await;
        if !response.is_error() {
            self.write(primary_key, stale_key, &response).await;
            return Ok(response);
        }

        if let Some(error) = response.error() {
            debug!(%error, key = %stale_key, "Upstream failed, looking up stale cache");
        }
        if let Some(stale) = self.read(&stale_key, &request, ResponseSource::Stale).await {
            metrics::record_stale_hit();
            return Ok(stale);
        }
        finish(response, raise_error)
    }

    async fn call_upstream(&self, request: Request) -> Response {
        let timer = Timer::new();
        let response = self.transport.fetch(request).await;
        metrics::record_upstream(timer.elapsed(), response.is_error());
        response
    }

    async fn read(
        &self,
        key: &str,
        request: &Request,
        source: ResponseSource,
    ) -> Option<Response> {
        let backend = self.backend.name();
        let timer = Timer::new();
        let raw = match self.backend.get(key).await {
            Ok(raw) => {
                let bytes = raw.as_ref().map_or(0, |raw| raw.len());
                backend_metrics::record_read(&backend, bytes, true, timer.elapsed());
                raw?
            }
            Err(error) => {
                backend_metrics::record_read(&backend, 0, false, timer.elapsed());
                metrics::record_cache_read_error();
                warn!(%backend, key, %error, "Cache read failed, treating as miss");
                return None;
            }
        };

        match deserialize_response(self.format.as_ref(), request.clone(), &raw) {
            Ok(response) => {
                debug!(%backend, key, source = source.as_str(), "Loaded cache");
                Some(response.with_source(source))
            }
            Err(error) => {
                metrics::record_cache_read_error();
                warn!(%backend, key, %error, "Malformed cache entry, treating as miss");
                None
            }
        }
    }

    async fn write(&self, primary_key: String, stale_key: String, response: &Response) {
        let value = match serialize_response(self.format.as_ref(), response) {
            Ok(value) => value,
            Err(error) => {
                metrics::record_cache_write_error();
                warn!(key = %primary_key, %error, "Response is not cacheable, skipping cache write");
                return;
            }
        };

        debug!(
            key = %primary_key,
            ttl = ?self.config.ttl,
            stale_ttl = ?self.config.stale_ttl,
            "Caching response"
        );
        let backend = self.backend.name();
        let bytes = value.len() * 2;
        let entries = vec![
            WriteEntry::new(primary_key, value.clone(), self.config.ttl),
            WriteEntry::new(stale_key, value, self.config.stale_ttl),
        ];
        let timer = Timer::new();
        let result = self.backend.multi_set(entries).await;
        backend_metrics::record_write(&backend, bytes, result.is_ok(), timer.elapsed());
        if let Err(error) = result {
            metrics::record_cache_write_error();
            warn!(%backend, %error, "Cache write failed");
        }
    }
}

fn finish(response: Response, raise_error: bool) -> Result<Response, TransportError> {
    if raise_error {
        response.rethrow()
    } else {
        Ok(response)
    }
}

/// Builder for [`StaleCacheFetcher`].
///
/// Use [`StaleCacheFetcher::builder()`] to create a new builder. A store and
/// a transport are required; the configuration defaults to
/// [`FetcherConfig::default`] and the record format to [`JsonFormat`].
pub struct FetcherBuilder<B, T> {
    backend: B,
    transport: T,
    config: FetcherConfig,
    format: Arc<dyn Format>,
}

impl FetcherBuilder<NotSet, NotSet> {
    /// Creates a new builder with no store or transport set.
    pub fn new() -> Self {
        Self {
            backend: NotSet,
            transport: NotSet,
            config: FetcherConfig::default(),
            format: Arc::new(JsonFormat),
        }
    }
}

impl Default for FetcherBuilder<NotSet, NotSet> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, T> FetcherBuilder<B, T> {
    /// Sets the store backing both tiers.
    pub fn backend<NewB>(self, backend: NewB) -> FetcherBuilder<NewB, T>
    where
        NewB: Backend,
    {
        FetcherBuilder {
            backend,
            transport: self.transport,
            config: self.config,
            format: self.format,
        }
    }

    /// Sets the transport used to reach the origin.
    pub fn transport<NewT>(self, transport: NewT) -> FetcherBuilder<B, NewT>
    where
        NewT: Transport,
    {
        FetcherBuilder {
            backend: self.backend,
            transport,
            config: self.config,
            format: self.format,
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: FetcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the record format.
    pub fn format(mut self, format: impl Format + 'static) -> Self {
        self.format = Arc::new(format);
        self
    }
}

impl<B, T> FetcherBuilder<B, T>
where
    B: Backend,
    T: Transport,
{
    /// Builds the fetcher.
    pub fn build(self) -> StaleCacheFetcher<B, T> {
        let prefixes = self.config.prefixes();
        StaleCacheFetcher {
            backend: Arc::new(self.backend),
            transport: Arc::new(self.transport),
            config: Arc::new(self.config),
            prefixes: Arc::new(prefixes),
            format: self.format,
        }
    }
}
