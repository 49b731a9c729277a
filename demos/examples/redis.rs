//! Sharing cached responses through Redis.
//!
//! Requires a running server, by default at `redis://127.0.0.1/`. Set
//! `REDIS_URL` to point elsewhere.

use std::time::Duration;

use reqwest::Client;
use reqwest_middleware::ClientBuilder;
use stalebox::prelude::*;
use stalebox_redis::RedisBackend;
use stalebox_reqwest::ReqwestTransport;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("stalebox=debug,stalebox_redis=trace")
        .init();

    let server = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_owned());
    let backend = RedisBackend::builder().server(server).build()?;

    let client = ClientBuilder::new(Client::new()).build();
    let transport = ReqwestTransport::new(client);

    let config = FetcherConfig::builder()
        .ttl(Duration::from_secs(30))
        .stale_ttl(Duration::from_secs(24 * 60 * 60))
        .vary(["Accept"])
        .build();
    let fetcher = StaleCacheFetcher::new(backend, transport, config);

    for accept in ["application/json", "text/html"] {
        let request = Request::builder("http://httpbin.org/anything")
            .header(reqwest::header::ACCEPT, accept.parse()?)
            .build();
        let key = fetcher.primary_key(&request, fetcher.config().vary.as_slice())?;
        let response = fetcher.fetch(request, FetchOptions::new()).await?;
        println!(
            "{key}: {} ({:?}), {} bytes",
            response.code(),
            response.source(),
            response.body().len()
        );
    }

    Ok(())
}
