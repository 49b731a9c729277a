use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use stalebox_backend::{Backend, BackendError, BackendResult, WriteEntry};
use stalebox_core::{BackendLabel, Raw};

#[derive(Debug, Default)]
pub struct BackendCounters {
    pub read_count: AtomicUsize,
    pub read_hit_count: AtomicUsize,
    pub read_miss_count: AtomicUsize,
    pub write_count: AtomicUsize,
}

impl BackendCounters {
    pub fn read_count(&self) -> usize {
        self.read_count.load(Ordering::SeqCst)
    }

    pub fn read_hit_count(&self) -> usize {
        self.read_hit_count.load(Ordering::SeqCst)
    }

    pub fn read_miss_count(&self) -> usize {
        self.read_miss_count.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.read_count.store(0, Ordering::SeqCst);
        self.read_hit_count.store(0, Ordering::SeqCst);
        self.read_miss_count.store(0, Ordering::SeqCst);
        self.write_count.store(0, Ordering::SeqCst);
    }
}

/// A value held by [`MockBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub value: Raw,
    pub ttl: Option<Duration>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredValue {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= Utc::now())
    }
}

/// In-memory store for tests.
///
/// Writes of one `multi_set` call are applied under an exclusive gate, so a
/// concurrent `get` observes either none or all of them.
#[derive(Clone, Debug)]
pub struct MockBackend {
    pub cache: Arc<DashMap<String, StoredValue>>,
    pub counters: Arc<BackendCounters>,
    writes: Arc<Mutex<Vec<Vec<WriteEntry>>>>,
    gate: Arc<RwLock<()>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            counters: Arc::new(BackendCounters::default()),
            writes: Arc::new(Mutex::new(Vec::new())),
            gate: Arc::new(RwLock::new(())),
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn read_count(&self) -> usize {
        self.counters.read_count()
    }

    pub fn read_hit_count(&self) -> usize {
        self.counters.read_hit_count()
    }

    pub fn read_miss_count(&self) -> usize {
        self.counters.read_miss_count()
    }

    pub fn write_count(&self) -> usize {
        self.counters.write_count()
    }

    pub fn reset_counters(&self) {
        self.counters.reset();
    }

    pub fn cache_entry_count(&self) -> usize {
        self.cache.len()
    }

    /// Makes every following `get` fail with a connection error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every following `multi_set` fail with a connection error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the stored value of a key, ignoring expiry.
    pub fn stored(&self, key: &str) -> Option<StoredValue> {
        self.cache.get(key).map(|entry| entry.value().clone())
    }

    /// Returns the raw bytes of a key, ignoring expiry.
    pub fn raw(&self, key: &str) -> Option<Raw> {
        self.stored(key).map(|stored| stored.value)
    }

    /// Seeds a key directly, bypassing counters and history.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Raw>, ttl: Option<Duration>) {
        self.cache.insert(key.into(), stored(value.into(), ttl));
    }

    /// Marks a key as expired without waiting for its TTL.
    pub fn expire(&self, key: &str) {
        if let Some(mut entry) = self.cache.get_mut(key) {
            entry.expires_at = Some(Utc::now() - chrono::Duration::seconds(1));
        }
    }

    /// Returns every `multi_set` batch received, in order.
    pub fn writes(&self) -> Vec<Vec<WriteEntry>> {
        self.writes.lock().unwrap().clone()
    }
}

fn stored(value: Raw, ttl: Option<Duration>) -> StoredValue {
    let expires_at = ttl
        .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
        .and_then(|ttl| Utc::now().checked_add_signed(ttl));
    StoredValue {
        value,
        ttl,
        expires_at,
    }
}

fn injected(operation: &str) -> BackendError {
    BackendError::ConnectionError(format!("injected {operation} failure").into())
}

#[async_trait]
impl Backend for MockBackend {
    async fn get(&self, key: &str) -> BackendResult<Option<Raw>> {
        self.counters.read_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected("read"));
        }
        let result = {
            let _gate = self.gate.read().unwrap();
            self.cache
                .get(key)
                .filter(|entry| !entry.is_expired())
                .map(|entry| entry.value.clone())
        };
        if result.is_some() {
            self.counters.read_hit_count.fetch_add(1, Ordering::SeqCst);
        } else {
            self.counters.read_miss_count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(result)
    }

    async fn multi_set(&self, entries: Vec<WriteEntry>) -> BackendResult<()> {
        self.counters.write_count.fetch_add(1, Ordering::SeqCst);
        self.writes.lock().unwrap().push(entries.clone());
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(injected("write"));
        }
        let _gate = self.gate.write().unwrap();
        for entry in entries {
            self.cache.insert(entry.key, stored(entry.value, entry.ttl));
        }
        Ok(())
    }

    fn name(&self) -> BackendLabel {
        BackendLabel::new_static("mock")
    }
}
