use fetchflow::FetchingEngine;
use fetchflow::config::{DispatcherConfig, HumanDuration};
use fetchflow::fetch::{FetchResponse, FixedFetcher};
use fetchflow::flow::{ErrorKind, Flow, SkippingHandler, StageError, pipe_fn};
use reqwest::Url;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn uri(path: &str) -> Url {
    Url::parse("http://engine.test/").unwrap().join(path).unwrap()
}

fn engine() -> FetchingEngine {
    let fetcher = Arc::new(
        FixedFetcher::new()
            .with_resource(uri("a"), "12")
            .with_resource(uri("b"), "not a number"),
    );
    let config = DispatcherConfig {
        workers: 2,
        queue_capacity: None,
        poll_interval: HumanDuration::from_millis(10),
    };
    FetchingEngine::start(fetcher, &config)
}

fn number_flow(sink: Arc<Mutex<Vec<i64>>>) -> Flow<FetchResponse, ()> {
    Flow::builder(pipe_fn("body", |response: FetchResponse| {
        response.content_text().ok_or_else(|| {
            let cause = response
                .failure_cause()
                .map(|c| c.to_string())
                .unwrap_or_default();
            StageError::new(ErrorKind::Fetch, cause)
        })
    }))
    .pipe(pipe_fn("parse", |text: String| {
        text.parse::<i64>()
            .map_err(|e| StageError::new(ErrorKind::Parse, e))
    }))
    .pipe(pipe_fn("store", move |n: i64| {
        sink.lock().unwrap().push(n);
        Ok(())
    }))
    .on(ErrorKind::Parse, SkippingHandler)
    .build()
}

#[tokio::test]
async fn test_recovered_and_escalated_flows() {
    let engine = engine();
    let sink = Arc::new(Mutex::new(Vec::new()));

    // parse failures recover, fetch failures escalate
    let flow = Arc::new(number_flow(sink.clone()));
    assert_eq!(flow.stages(), ["body", "parse", "store"]);

    engine.get(uri("a"), flow.clone()).unwrap();
    engine.get(uri("b"), flow.clone()).unwrap();
    engine.get(uri("missing"), flow).unwrap();

    assert!(engine.await_idleness_timeout(Duration::from_secs(2)).await);

    assert_eq!(*sink.lock().unwrap(), vec![12]);
    let metrics = engine.metrics();
    assert_eq!(metrics.jobs_completed, 3);
    assert_eq!(metrics.callback_failures, 1);

    engine.shutdown();
    assert!(engine.await_termination(Duration::from_secs(2)).await);
}

#[tokio::test]
async fn test_shutdown_now_through_engine() {
    let engine = engine();
    engine.shutdown();

    let flow = Arc::new(number_flow(Arc::default()));
    assert!(engine.get(uri("a"), flow).is_err());
    assert_eq!(engine.shutdown_now().await, 0);
    assert_eq!(engine.active_jobs(), 0);
}
