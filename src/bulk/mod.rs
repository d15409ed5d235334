//! Bulk fetch coordinator
//!
//! Fans N fetches out over a shared task pool and waits for all of them,
//! collecting responses in completion order. Per-locator failures are data in
//! the [`BulkResult`]; only a task that dies without a response fails the call.

mod result;

pub use result::BulkResult;

use reqwest::Url;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace};

use crate::config::BulkConfig;
use crate::error::{EngineError, Result};
use crate::fetch::{FetchFailure, FetchResponse, PostBody, UriAndContext, UriFetcher};

/// Parallel fetcher; clones share the same concurrency pool
#[derive(Clone)]
pub struct BulkFetcher {
    fetcher: Arc<dyn UriFetcher>,
    permits: Arc<Semaphore>,
    task_timeout: Option<Duration>,
}

impl BulkFetcher {
    pub fn new(fetcher: Arc<dyn UriFetcher>, config: &BulkConfig) -> Self {
        Self {
            fetcher,
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            task_timeout: config.task_timeout.map(|t| t.as_duration()),
        }
    }

    /// Fetch every locator
    pub async fn get(&self, uris: impl IntoIterator<Item = Url>) -> Result<BulkResult> {
        self.get_ctx(uris.into_iter().map(UriAndContext::from)).await
    }

    /// Fetch every target, keeping the caller context on each response
    ///
    /// Duplicate locators are fetched once; the first occurrence wins.
    pub async fn get_ctx(&self, targets: impl IntoIterator<Item = UriAndContext>) -> Result<BulkResult> {
        let mut seen = HashSet::new();
        let mut tasks = JoinSet::new();

        for target in targets {
            if !seen.insert(target.uri().clone()) {
                debug!(uri = %target.uri(), "Skipping duplicate locator");
                continue;
            }

            let fetcher = self.fetcher.clone();
            let permits = self.permits.clone();
            let task_timeout = self.task_timeout;

            tasks.spawn(async move {
                // the semaphore is never closed
                let _permit = permits.acquire_owned().await.ok();
                fetch_target(fetcher.as_ref(), target, task_timeout).await
            });
        }

        let expected = tasks.len();
        let mut responses = Vec::with_capacity(expected);

        // completion order, not submission order
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(response) => {
                    trace!(uri = %response.uri(), success = response.is_success(), "Collected response");
                    responses.push(response);
                }
                Err(e) => {
                    error!(error = %e, collected = responses.len(), expected, "Bulk task ended without a response");
                    return Err(EngineError::Aggregation {
                        message: format!(
                            "task ended without a response after {} of {} collected",
                            responses.len(),
                            expected
                        ),
                        source: Some(e),
                    });
                }
            }
        }

        let result = BulkResult::from_responses(responses);
        info!(
            total = result.len(),
            succeeded = result.successful().len(),
            failed = result.failed().len(),
            "Bulk fetch completed"
        );

        Ok(result)
    }

    /// Fetch a single target through the pool
    pub async fn get_one(&self, target: impl Into<UriAndContext>) -> Result<FetchResponse> {
        let target = target.into();
        let uri = target.uri().clone();

        self.get_ctx([target])
            .await?
            .remove(&uri)
            .ok_or_else(|| EngineError::Aggregation {
                message: format!("no response collected for {uri}"),
                source: None,
            })
    }

    /// Bulk POST is not supported
    pub async fn post(
        &self,
        _targets: impl IntoIterator<Item = UriAndContext>,
        _body: PostBody,
    ) -> Result<BulkResult> {
        Err(EngineError::Unsupported("bulk POST"))
    }
}

async fn fetch_target(
    fetcher: &dyn UriFetcher,
    target: UriAndContext,
    task_timeout: Option<Duration>,
) -> FetchResponse {
    let Some(limit) = task_timeout else {
        return fetcher.get(&target).await;
    };

    let fetched = tokio::time::timeout(limit, fetcher.get(&target)).await;
    match fetched {
        Ok(response) => response,
        Err(_) => {
            debug!(uri = %target.uri(), ?limit, "Fetch timed out");
            FetchResponse::failure(target, FetchFailure::new(format!("fetch timed out after {limit:?}")))
        }
    }
}
