//! Integration tests for ReqwestTransport using wiremock.

use std::time::Duration;

use http::{HeaderValue, Method, StatusCode};
use pretty_assertions::assert_eq;
use reqwest::Client;
use stalebox::{FetchOptions, FetcherConfig, ResponseSource, StaleCacheFetcher};
use stalebox_core::{Request, RequestOptions, Transport, TransportErrorKind};
use stalebox_reqwest::ReqwestTransport;
use stalebox_test::MockBackend;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn forwards_request_and_buffers_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("accept", "application/json"))
        .and(body_string("payload"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_string("created")
                .insert_header("X-Custom-Header", "custom-value"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(Client::new());
    let request = Request::builder(format!("{}/users", mock_server.uri()))
        .method(Method::POST)
        .header(http::header::ACCEPT, HeaderValue::from_static("application/json"))
        .body("payload")
        .build();

    let response = transport.fetch(request).await;

    assert!(!response.is_error(), "{:?}", response.error());
    assert_eq!(response.code(), StatusCode::CREATED);
    assert_eq!(response.body().as_ref(), b"created");
    assert_eq!(response.headers()["x-custom-header"], "custom-value");
    assert_eq!(response.request().method(), Method::POST);
}

#[tokio::test]
async fn error_status_is_a_failure_by_default() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(Client::new());
    let response = transport
        .fetch(Request::get(format!("{}/down", mock_server.uri())))
        .await;

    let error = response.error().expect("503 must be reported");
    assert_eq!(error.kind(), TransportErrorKind::Status);
    assert_eq!(error.code(), Some(StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(response.code(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body().as_ref(), b"maintenance");
}

#[tokio::test]
async fn error_status_passes_when_disabled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(Client::new()).error_for_status(false);
    let response = transport
        .fetch(Request::get(format!("{}/missing", mock_server.uri())))
        .await;

    assert!(!response.is_error());
    assert_eq!(response.code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refused_connection_is_a_connect_error() {
    let transport = ReqwestTransport::new(Client::new());
    let response = transport.fetch(Request::get("http://127.0.0.1:1/")).await;

    let error = response.error().expect("connection must fail");
    assert_eq!(error.kind(), TransportErrorKind::Connect);
    assert_eq!(response.code().as_u16(), 599);
}

#[tokio::test]
async fn request_timeout_is_applied() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(Client::new());
    let request = Request::builder(format!("{}/slow", mock_server.uri()))
        .timeout(Duration::from_millis(50))
        .build();
    let response = transport.fetch(request).await;

    let error = response.error().expect("request must time out");
    assert!(error.is_timeout(), "{error:?}");
}

#[tokio::test]
async fn fetcher_serves_stale_when_origin_starts_failing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("known good"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let backend = MockBackend::new();
    let fetcher = StaleCacheFetcher::builder()
        .backend(backend.clone())
        .transport(ReqwestTransport::new(Client::new()))
        .config(FetcherConfig::default())
        .build();
    let url = format!("{}/data", mock_server.uri());

    let first = fetcher.get(url.clone()).await.unwrap();
    assert_eq!(first.source(), ResponseSource::Upstream);

    let primary_key = fetcher.primary_key(&Request::get(url.clone()), &[] as &[&str]).unwrap();
    backend.expire(&primary_key);

    let second = fetcher
        .fetch(
            url.as_str(),
            FetchOptions::new().request(RequestOptions::new().timeout(Duration::from_secs(5))),
        )
        .await
        .unwrap();
    assert_eq!(second.source(), ResponseSource::Stale);
    assert_eq!(second.body().as_ref(), b"known good");
}
