use fetchflow::config::{BulkConfig, HumanDuration};
use fetchflow::fetch::{FetchFailure, FetchRequest, FetchResponse, FixedFetcher, PostBody, UriAndContext, UriFetcher};
use fetchflow::{BulkFetcher, EngineError};
use async_trait::async_trait;
use reqwest::Url;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn uri(n: usize) -> Url {
    Url::parse(&format!("http://bulk.test/item/{n}")).unwrap()
}

fn config(max_concurrent: usize) -> BulkConfig {
    BulkConfig {
        max_concurrent,
        task_timeout: None,
    }
}

#[tokio::test]
async fn test_every_locator_gets_exactly_one_entry() {
    // even items exist, odd items 404
    let fetcher = (0..50)
        .filter(|n| n % 2 == 0)
        .fold(FixedFetcher::new(), |f, n| f.with_resource(uri(n), format!("item {n}")));
    let bulk = BulkFetcher::new(Arc::new(fetcher), &config(8));

    let result = bulk.get((0..50).map(uri)).await.unwrap();

    assert_eq!(result.len(), 50);
    assert_eq!(result.successful().len(), 25);
    assert_eq!(result.failed().len(), 25);
    assert!(!result.all_succeeded());

    for n in 0..50 {
        let response = result.get(&uri(n)).unwrap();
        assert_eq!(response.is_success(), n % 2 == 0);
    }
}

#[tokio::test]
async fn test_failed_locator_only_in_failed() {
    let fetcher = FixedFetcher::new().with_resource(uri(1), "one");
    let bulk = BulkFetcher::new(Arc::new(fetcher), &config(2));

    let result = bulk.get([uri(1), uri(2)]).await.unwrap();

    let failed: Vec<_> = result.failed().iter().map(|r| r.uri().clone()).collect();
    let successful: Vec<_> = result.successful().iter().map(|r| r.uri().clone()).collect();
    assert_eq!(failed, vec![uri(2)]);
    assert_eq!(successful, vec![uri(1)]);
    assert_eq!(result.get(&uri(2)).unwrap().status(), Some(404));
}

#[tokio::test]
async fn test_context_survives_the_fetch() {
    let fetcher = FixedFetcher::new().with_resource(uri(7), "seven");
    let bulk = BulkFetcher::new(Arc::new(fetcher), &config(2));

    let target = UriAndContext::new(uri(7)).with_entry("page", 3);
    let result = bulk.get_ctx([target]).await.unwrap();

    let response = result.get(&uri(7)).unwrap();
    assert_eq!(response.target().get("page"), Some(&serde_json::json!(3)));
    assert_eq!(response.content_text().as_deref(), Some("seven"));
}

/// Counts how many fetches run at the same time
struct GaugeFetcher {
    running: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl UriFetcher for GaugeFetcher {
    async fn fetch(&self, target: &UriAndContext, _request: &FetchRequest) -> FetchResponse {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.running.fetch_sub(1, Ordering::SeqCst);
        FetchResponse::success(target.clone(), Some(200), "ok")
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_is_bounded_by_pool() {
    let fetcher = Arc::new(GaugeFetcher {
        running: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });
    let bulk = BulkFetcher::new(fetcher.clone(), &config(3));

    let result = bulk.get((0..30).map(uri)).await.unwrap();

    assert!(result.all_succeeded());
    assert!(fetcher.peak.load(Ordering::SeqCst) <= 3);
}

struct PanickingFetcher;

#[async_trait]
impl UriFetcher for PanickingFetcher {
    async fn fetch(&self, target: &UriAndContext, _request: &FetchRequest) -> FetchResponse {
        if target.uri().path().ends_with("/13") {
            panic!("unlucky locator");
        }
        FetchResponse::failure(target.clone(), FetchFailure::new("never mind"))
    }
}

#[tokio::test]
async fn test_panicking_task_fails_the_aggregation() {
    let bulk = BulkFetcher::new(Arc::new(PanickingFetcher), &config(4));

    let err = bulk.get((10..16).map(uri)).await.unwrap_err();
    assert!(matches!(err, EngineError::Aggregation { .. }));
}

#[tokio::test]
async fn test_slow_fetch_times_out() {
    let fetcher = FixedFetcher::new()
        .with_resource(uri(1), "late")
        .with_delay(Duration::from_millis(300));
    let config = BulkConfig {
        max_concurrent: 4,
        task_timeout: Some(HumanDuration::from_millis(20)),
    };
    let bulk = BulkFetcher::new(Arc::new(fetcher), &config);

    let result = bulk.get([uri(1), uri(2)]).await.unwrap();
    assert_eq!(result.failed().len(), 2);
}

#[tokio::test]
async fn test_post_is_unsupported() {
    let bulk = BulkFetcher::new(Arc::new(FixedFetcher::new()), &config(1));
    let err = bulk
        .post([UriAndContext::new(uri(1))], PostBody::Bytes("body".into()))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Unsupported(_)));
}
