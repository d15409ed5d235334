use axum::body::Bytes;
use axum::extract::Form;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use fetchflow::config::{HttpConfig, HumanDuration};
use fetchflow::fetch::{FetchRequest, FormFields, HttpFetcher, PostBody, UriAndContext, UriFetcher};
use reqwest::Url;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;

async fn spawn_server(flaky_hits: Arc<AtomicUsize>) -> SocketAddr {
    let app = Router::new()
        .route("/ok", get(|| async { "hello" }))
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "nope") }))
        .route("/echo", post(|body: Bytes| async move { body }))
        .route(
            "/form",
            post(|Form(fields): Form<BTreeMap<String, String>>| async move {
                fields
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("&")
            }),
        )
        .route(
            "/flaky",
            get(move || {
                let hits = flaky_hits.clone();
                async move {
                    if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                        (StatusCode::SERVICE_UNAVAILABLE, "busy")
                    } else {
                        (StatusCode::OK, "recovered")
                    }
                }
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn fetcher(max_retries: u32) -> HttpFetcher {
    HttpFetcher::new(HttpConfig {
        max_retries,
        retry_backoff: HumanDuration::from_millis(10),
        ..HttpConfig::default()
    })
    .unwrap()
}

fn target(addr: SocketAddr, path: &str) -> UriAndContext {
    Url::parse(&format!("http://{addr}{path}")).unwrap().into()
}

#[tokio::test]
async fn test_get_success() {
    let addr = spawn_server(Arc::default()).await;

    let response = fetcher(1).get(&target(addr, "/ok")).await;

    assert!(response.is_success());
    assert_eq!(response.status(), Some(200));
    assert_eq!(response.content_text().as_deref(), Some("hello"));
}

#[tokio::test]
async fn test_client_error_is_failure_response() {
    let addr = spawn_server(Arc::default()).await;

    let response = fetcher(3).get(&target(addr, "/missing")).await;

    assert!(!response.is_success());
    assert_eq!(response.status(), Some(404));
    assert!(response.failure_cause().unwrap().message.contains("404"));
}

#[tokio::test]
async fn test_post_bytes_and_form() {
    let addr = spawn_server(Arc::default()).await;
    let fetcher = fetcher(1);

    let echoed = fetcher
        .fetch(
            &target(addr, "/echo"),
            &FetchRequest::Post(PostBody::Bytes("payload".into())),
        )
        .await;
    assert_eq!(echoed.content_text().as_deref(), Some("payload"));

    let mut fields = FormFields::new();
    fields.insert("a".into(), "1".into());
    fields.insert("b".into(), "2".into());
    let formed = fetcher
        .fetch(&target(addr, "/form"), &FetchRequest::Post(PostBody::Form(fields)))
        .await;
    assert_eq!(formed.content_text().as_deref(), Some("a=1&b=2"));
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let addr = spawn_server(hits.clone()).await;

    let response = fetcher(2).get(&target(addr, "/flaky")).await;

    assert!(response.is_success());
    assert_eq!(response.content_text().as_deref(), Some("recovered"));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_connection_refused_is_failure_response() {
    // bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let response = fetcher(1).get(&target(addr, "/ok")).await;

    assert!(!response.is_success());
    assert_eq!(response.status(), None);
}
