//! Moka backend implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use stalebox_backend::{Backend, BackendResult, WriteEntry};
use stalebox_core::{BackendLabel, Raw};
use tokio::sync::RwLock;
use tracing::trace;

use crate::builder::{MokaBackendBuilder, NoCapacity};

/// Value held by the cache together with the TTL it was written with.
#[derive(Debug, Clone)]
pub struct StoredValue {
    /// Serialized record.
    pub value: Raw,
    /// Lifetime from the last write; `None` never expires.
    pub ttl: Option<Duration>,
}

/// In-memory store powered by Moka.
///
/// Reads are served under a shared gate and each `multi_set` holds the gate
/// exclusively, so a reader sees either none or all keys of a batch.
///
/// # Examples
///
/// ```
/// use stalebox_moka::MokaBackend;
///
/// let backend = MokaBackend::builder().max_entries(10_000).build();
/// ```
///
/// # Caveats
///
/// - Data is **not persisted** and **not shared** across processes
/// - Expiration is **best-effort**: expired entries are never returned, but
///   may occupy capacity until Moka's housekeeping runs
#[derive(Clone)]
pub struct MokaBackend {
    /// The underlying Moka async cache instance.
    pub cache: Cache<String, StoredValue>,
    /// Label identifying this backend in logs and metrics.
    pub label: BackendLabel,
    pub(crate) gate: Arc<RwLock<()>>,
}

impl std::fmt::Debug for MokaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("label", &self.label)
            .field("cache", &self.cache)
            .finish()
    }
}

impl MokaBackend {
    /// Creates a new builder for `MokaBackend`.
    pub fn builder() -> MokaBackendBuilder<NoCapacity> {
        MokaBackendBuilder::new()
    }

    /// Returns the underlying cache.
    pub fn cache(&self) -> &Cache<String, StoredValue> {
        &self.cache
    }
}

#[async_trait]
impl Backend for MokaBackend {
    async fn get(&self, key: &str) -> BackendResult<Option<Raw>> {
        let _gate = self.gate.read().await;
        Ok(self.cache.get(key).await.map(|stored| stored.value))
    }

    async fn multi_set(&self, entries: Vec<WriteEntry>) -> BackendResult<()> {
        let _gate = self.gate.write().await;
        for entry in entries {
            trace!(key = %entry.key, ttl = ?entry.ttl, "moka insert");
            let stored = StoredValue {
                value: entry.value,
                ttl: entry.ttl,
            };
            self.cache.insert(entry.key, stored).await;
        }
        crate::metrics::record_capacity(
            self.label.as_str(),
            self.cache.entry_count(),
            self.cache.weighted_size(),
        );
        Ok(())
    }

    fn name(&self) -> BackendLabel {
        self.label.clone()
    }
}
