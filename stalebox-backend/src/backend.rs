use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use stalebox_core::{BackendLabel, Raw};

use crate::BackendError;

pub type BackendResult<T> = Result<T, BackendError>;

/// One key of an atomic multi-key write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteEntry {
    /// Store key.
    pub key: String,
    /// Serialized value.
    pub value: Raw,
    /// Time-to-live; `None` writes the key without an expiry.
    pub ttl: Option<Duration>,
}

impl WriteEntry {
    pub fn new(key: impl Into<String>, value: Raw, ttl: Option<Duration>) -> Self {
        Self {
            key: key.into(),
            value,
            ttl,
        }
    }

    /// Returns the TTL in whole milliseconds, as stores expect it.
    pub fn ttl_millis(&self) -> Option<u64> {
        self.ttl.map(ttl_millis)
    }
}

/// Converts a TTL to milliseconds, rounding up.
///
/// Stores reject a zero expiry, so anything below one millisecond
/// (including zero) becomes `1`.
pub fn ttl_millis(ttl: Duration) -> u64 {
    let nanos = ttl.as_nanos();
    let millis = nanos.div_ceil(1_000_000);
    u64::try_from(millis).unwrap_or(u64::MAX).max(1)
}

/// Key-value store capability used by the fetcher.
///
/// Both operations may suspend. `multi_set` must apply all entries as one
/// atomic unit: an observer never sees one key of the batch updated without
/// the others.
#[async_trait]
pub trait Backend: Sync + Send {
    async fn get(&self, key: &str) -> BackendResult<Option<Raw>>;

    async fn multi_set(&self, entries: Vec<WriteEntry>) -> BackendResult<()>;

    /// Returns the label of this store for logs and metrics.
    fn name(&self) -> BackendLabel {
        BackendLabel::new_static("backend")
    }
}

#[async_trait]
impl Backend for &dyn Backend {
    async fn get(&self, key: &str) -> BackendResult<Option<Raw>> {
        (*self).get(key).await
    }

    async fn multi_set(&self, entries: Vec<WriteEntry>) -> BackendResult<()> {
        (*self).multi_set(entries).await
    }

    fn name(&self) -> BackendLabel {
        (*self).name()
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn get(&self, key: &str) -> BackendResult<Option<Raw>> {
        (**self).get(key).await
    }

    async fn multi_set(&self, entries: Vec<WriteEntry>) -> BackendResult<()> {
        (**self).multi_set(entries).await
    }

    fn name(&self) -> BackendLabel {
        (**self).name()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend + Send + 'static> {
    async fn get(&self, key: &str) -> BackendResult<Option<Raw>> {
        (**self).get(key).await
    }

    async fn multi_set(&self, entries: Vec<WriteEntry>) -> BackendResult<()> {
        (**self).multi_set(entries).await
    }

    fn name(&self) -> BackendLabel {
        (**self).name()
    }
}
