//! Redis backend implementation.

use async_trait::async_trait;
use bytes::Bytes;
use redis::{Client, aio::ConnectionManager};
use stalebox_backend::{Backend, BackendError, BackendResult, WriteEntry};
use stalebox_core::{BackendLabel, Raw};
use tokio::sync::OnceCell;
use tracing::trace;

use crate::error::Error;

/// Redis store based on the redis-rs crate.
///
/// It uses a [`ConnectionManager`] for asynchronous network interaction.
/// Values are stored as plain strings, so cached records can be inspected
/// with any Redis client.
///
/// [`ConnectionManager`]: redis::aio::ConnectionManager
#[derive(Clone)]
pub struct RedisBackend {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    name: BackendLabel,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("name", &self.name)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

impl RedisBackend {
    /// Create new backend instance for `redis://127.0.0.1/`.
    pub fn new() -> Result<Self, BackendError> {
        Ok(Self::builder().build()?)
    }

    /// Creates new RedisBackend builder with default settings.
    #[must_use]
    pub fn builder() -> RedisBackendBuilder {
        RedisBackendBuilder::default()
    }

    /// Create lazy connection to redis via [`ConnectionManager`]
    pub async fn connection(&self) -> Result<&ConnectionManager, BackendError> {
        trace!("Get connection manager");
        let manager = self
            .connection
            .get_or_try_init(|| {
                trace!("Initialize new redis connection manager");
                self.client.get_connection_manager()
            })
            .await
            .map_err(Error::from)?;
        Ok(manager)
    }
}

/// Part of builder pattern implementation for RedisBackend.
pub struct RedisBackendBuilder {
    connection_info: String,
    name: BackendLabel,
}

impl Default for RedisBackendBuilder {
    fn default() -> Self {
        Self {
            connection_info: "redis://127.0.0.1/".to_owned(),
            name: BackendLabel::new_static("redis"),
        }
    }
}

impl RedisBackendBuilder {
    /// Set connection info (host, port, database, etc.) for RedisBackend.
    pub fn server(mut self, connection_info: impl Into<String>) -> Self {
        self.connection_info = connection_info.into();
        self
    }

    /// Set a custom name for this backend, used in logs and metrics.
    pub fn name(mut self, name: impl Into<BackendLabel>) -> Self {
        self.name = name.into();
        self
    }

    /// Create new instance of Redis backend with passed settings.
    ///
    /// Only the URL is validated here; no connection is opened until the
    /// first operation.
    pub fn build(self) -> Result<RedisBackend, Error> {
        Ok(RedisBackend {
            client: Client::open(self.connection_info)?,
            connection: OnceCell::new(),
            name: self.name,
        })
    }
}

#[async_trait]
impl Backend for RedisBackend {
    async fn get(&self, key: &str) -> BackendResult<Option<Raw>> {
        let mut con = self.connection().await?.clone();
        let value: Option<Vec<u8>> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(value.map(Bytes::from))
    }

    async fn multi_set(&self, entries: Vec<WriteEntry>) -> BackendResult<()> {
        let mut con = self.connection().await?.clone();

        // MULTI/EXEC: all keys become visible together.
        let mut pipe = redis::pipe();
        pipe.atomic();
        for entry in &entries {
            let cmd = pipe.cmd("SET").arg(&entry.key).arg(entry.value.as_ref());
            if let Some(millis) = entry.ttl_millis() {
                cmd.arg("PX").arg(millis);
            }
            cmd.ignore();
        }

        pipe.query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    fn name(&self) -> BackendLabel {
        self.name.clone()
    }
}
