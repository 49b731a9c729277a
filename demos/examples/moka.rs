//! Stale fallback with the in-memory moka store.
//!
//! The second fetch is served from the primary tier. Once the primary entry
//! has expired, a request that cannot finish in time is answered from the
//! stale tier instead of failing.

use std::time::Duration;

use reqwest::Client;
use stalebox::prelude::*;
use stalebox::{RequestOptions, ResponseSource};
use stalebox_moka::MokaBackend;
use stalebox_reqwest::ReqwestTransport;

const URL: &str = "http://httpbin.org/uuid";

fn describe(label: &str, response: &Response) {
    let source = match response.source() {
        ResponseSource::Upstream => "origin",
        ResponseSource::Primary => "primary cache",
        ResponseSource::Stale => "stale cache",
    };
    println!(
        "{label}: {} from {source}, {} bytes",
        response.code(),
        response.body().len()
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("stalebox=debug")
        .init();

    let config = serde_saphyr::from_str::<FetcherConfig>(
        r#"
        primary_key_prefix: demo
        stale_key_prefix: demo_stale
        ttl: 1s
        stale_ttl: 1h
        "#,
    )?;

    let fetcher = StaleCacheFetcher::builder()
        .backend(MokaBackend::builder().max_entries(1_000).build())
        .transport(ReqwestTransport::new(Client::new()))
        .config(config)
        .build();

    let response = fetcher.get(URL).await?;
    describe("first", &response);

    let response = fetcher.get(URL).await?;
    describe("second", &response);

    tokio::time::sleep(Duration::from_secs(2)).await;

    // A 1ms budget makes the origin call fail.
    let options = FetchOptions::new()
        .request(RequestOptions::new().timeout(Duration::from_millis(1)));
    let response = fetcher.fetch(URL, options).await?;
    describe("after expiry", &response);

    Ok(())
}
