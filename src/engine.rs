//! Dispatcher paired with flows: every fetched response runs through a flow

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, trace};
use uuid::Uuid;

use crate::config::DispatcherConfig;
use crate::dispatcher::AsyncDispatcher;
use crate::error::{AnyError, Result};
use crate::fetch::{FetchResponse, PostBody, UriAndContext, UriFetcher};
use crate::flow::{Flow, FlowOutcome};
use crate::observability::MetricsSnapshot;

/// Fetches asynchronously and processes each response with a [`Flow`]
///
/// Recovered flow outcomes are logged; escalated ones count as callback
/// failures of the job and never reach the submitter.
#[derive(Clone)]
pub struct FetchingEngine {
    dispatcher: AsyncDispatcher,
}

impl FetchingEngine {
    pub fn new(dispatcher: AsyncDispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn start(fetcher: Arc<dyn UriFetcher>, config: &DispatcherConfig) -> Self {
        Self::new(AsyncDispatcher::start(fetcher, config))
    }

    pub fn get<O: 'static>(
        &self,
        target: impl Into<UriAndContext>,
        flow: Arc<Flow<FetchResponse, O>>,
    ) -> Result<Uuid> {
        self.dispatcher
            .get(target, move |response| process(&flow, response))
    }

    pub fn post<O: 'static>(
        &self,
        target: impl Into<UriAndContext>,
        body: PostBody,
        flow: Arc<Flow<FetchResponse, O>>,
    ) -> Result<Uuid> {
        self.dispatcher
            .post(target, body, move |response| process(&flow, response))
    }

    pub async fn await_idleness(&self) {
        self.dispatcher.await_idleness().await
    }

    pub async fn await_idleness_timeout(&self, timeout: Duration) -> bool {
        self.dispatcher.await_idleness_timeout(timeout).await
    }

    pub fn shutdown(&self) {
        self.dispatcher.shutdown()
    }

    pub async fn shutdown_now(&self) -> usize {
        self.dispatcher.shutdown_now().await
    }

    pub async fn await_termination(&self, timeout: Duration) -> bool {
        self.dispatcher.await_termination(timeout).await
    }

    pub fn active_jobs(&self) -> usize {
        self.dispatcher.active_jobs()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.dispatcher.metrics()
    }

    pub fn dispatcher(&self) -> &AsyncDispatcher {
        &self.dispatcher
    }
}

fn process<O>(
    flow: &Flow<FetchResponse, O>,
    response: FetchResponse,
) -> std::result::Result<(), AnyError> {
    let uri = response.uri().clone();

    match flow.execute(response)? {
        FlowOutcome::Completed(_) => {
            trace!(%uri, "Flow completed");
        }
        FlowOutcome::Recovered { kind, stage } => {
            info!(%uri, %kind, stage = stage.as_deref(), "Flow recovered from stage failure");
        }
    }

    Ok(())
}
