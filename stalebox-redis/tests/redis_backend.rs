//! Integration tests against a real Redis server.
//!
//! Run with `cargo test -p stalebox-redis -- --ignored`. A container is
//! started unless `REDIS_URL` is set.

use std::time::Duration;

use bytes::Bytes;
use stalebox::{FetchOptions, FetcherConfig, ResponseSource, StaleCacheFetcher};
use stalebox_backend::{Backend, BackendError, WriteEntry};
use stalebox_redis::RedisBackend;
use stalebox_test::{MockTransport, Reply};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::redis::{REDIS_PORT, Redis};

struct Server {
    url: String,
    _container: Option<ContainerAsync<Redis>>,
}

async fn server() -> Server {
    if let Ok(url) = std::env::var("REDIS_URL") {
        return Server {
            url,
            _container: None,
        };
    }
    let container = Redis::default()
        .with_tag("7-alpine")
        .start()
        .await
        .expect("Failed to start Redis container");
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(REDIS_PORT).await.unwrap();
    Server {
        url: format!("redis://{host}:{port}/"),
        _container: Some(container),
    }
}

#[tokio::test]
#[ignore = "requires docker or REDIS_URL"]
async fn multi_set_applies_per_key_ttl() {
    let server = server().await;
    let backend = RedisBackend::builder().server(&server.url).build().unwrap();

    backend
        .multi_set(vec![
            WriteEntry::new("t:primary", Bytes::from_static(b"v1"), Some(Duration::from_millis(200))),
            WriteEntry::new("t:stale", Bytes::from_static(b"v1"), None),
        ])
        .await
        .unwrap();

    assert_eq!(
        backend.get("t:primary").await.unwrap(),
        Some(Bytes::from_static(b"v1"))
    );
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(backend.get("t:primary").await.unwrap(), None);
    assert_eq!(
        backend.get("t:stale").await.unwrap(),
        Some(Bytes::from_static(b"v1"))
    );
}

#[tokio::test]
#[ignore = "requires docker or REDIS_URL"]
async fn stale_response_survives_primary_expiry() {
    let server = server().await;
    let backend = RedisBackend::builder().server(&server.url).build().unwrap();
    let transport = MockTransport::new();
    transport.push(Reply::ok("fresh"));
    let fetcher = StaleCacheFetcher::builder()
        .backend(backend)
        .transport(transport.clone())
        .config(
            FetcherConfig::builder()
                .ttl(Duration::from_millis(100))
                .build(),
        )
        .build();

    let first = fetcher.get("/users").await.unwrap();
    assert_eq!(first.source(), ResponseSource::Upstream);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let second = fetcher.fetch("/users", FetchOptions::new()).await.unwrap();

    assert_eq!(second.source(), ResponseSource::Stale);
    assert_eq!(second.body().as_ref(), b"fresh");
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn invalid_url_fails_on_build() {
    assert!(RedisBackend::builder().server("not-a-valid-url").build().is_err());
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    let backend = RedisBackend::builder()
        .server("redis://127.0.0.1:1/")
        .build()
        .unwrap();

    let result = backend.get("key").await;
    assert!(
        matches!(result, Err(BackendError::ConnectionError(_))),
        "{result:?}"
    );
}
