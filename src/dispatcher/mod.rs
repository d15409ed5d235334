//! Asynchronous fetch dispatcher
//!
//! Submissions return immediately; a fixed pool of worker tasks pulls jobs
//! off a shared [`JobQueue`], runs the fetch and hands the response to the
//! job's callback.
//!
//! Architecture:
//! 1. `get`/`post` acquire an active-job guard (counter +1)
//! 2. The job, guard included, is pushed onto the queue without waiting
//! 3. A worker polls the job, fetches, runs the callback
//! 4. The guard is dropped after the callback (counter -1)
//!
//! A job that never runs (rejected, abandoned by `shutdown_now`) drops its
//! guard too, so the counter only reaches zero when nothing is queued or
//! running. `await_idleness` waits for exactly that.

mod job;
mod worker;

pub use job::Callback;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::DispatcherConfig;
use crate::error::{AnyError, EngineError, Result};
use crate::fetch::{FetchRequest, FetchResponse, PostBody, UriAndContext, UriFetcher};
use crate::observability::{Metrics, MetricsSnapshot};
use crate::queue::JobQueue;
use job::{ActiveJobs, Job};
use worker::Worker;

/// Handle to a running dispatcher; clones share the same pool and counter
#[derive(Clone)]
pub struct AsyncDispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    queue: Arc<JobQueue<Job>>,
    active: Arc<ActiveJobs>,
    metrics: Arc<Metrics>,
    cancel: CancellationToken,
    workers: Mutex<JoinSet<()>>,
}

impl AsyncDispatcher {
    /// Create the queue and spawn the worker pool on the current runtime
    pub fn start(fetcher: Arc<dyn UriFetcher>, config: &DispatcherConfig) -> Self {
        let queue = Arc::new(JobQueue::with_capacity(
            config.queue_capacity,
            config.poll_interval.as_duration(),
        ));
        let metrics = Arc::new(Metrics::new());
        let cancel = CancellationToken::new();
        let num_workers = config.workers.max(1);

        let mut workers = JoinSet::new();
        for worker_id in 0..num_workers {
            let worker = Worker {
                id: worker_id,
                queue: queue.clone(),
                fetcher: fetcher.clone(),
                metrics: metrics.clone(),
                cancel: cancel.clone(),
            };
            workers.spawn(worker.run());
        }

        info!(
            workers = num_workers,
            queue_capacity = ?config.queue_capacity,
            poll_interval = %config.poll_interval,
            "Dispatcher started"
        );

        Self {
            inner: Arc::new(Inner {
                queue,
                active: Arc::new(ActiveJobs::default()),
                metrics,
                cancel,
                workers: Mutex::new(workers),
            }),
        }
    }

    /// Submit a GET; `callback` receives the response on a worker
    ///
    /// Returns the job id, or `Rejected` if the dispatcher is shut down or its
    /// bounded queue is full. A rejected callback is never invoked.
    pub fn get<F>(&self, target: impl Into<UriAndContext>, callback: F) -> Result<Uuid>
    where
        F: FnOnce(FetchResponse) -> std::result::Result<(), AnyError> + Send + 'static,
    {
        self.submit(target.into(), FetchRequest::Get, Box::new(callback))
    }

    /// Submit a POST with a raw or form body
    pub fn post<F>(
        &self,
        target: impl Into<UriAndContext>,
        body: PostBody,
        callback: F,
    ) -> Result<Uuid>
    where
        F: FnOnce(FetchResponse) -> std::result::Result<(), AnyError> + Send + 'static,
    {
        self.submit(target.into(), FetchRequest::Post(body), Box::new(callback))
    }

    fn submit(&self, target: UriAndContext, request: FetchRequest, callback: Callback) -> Result<Uuid> {
        // counted before the queue can hand it to a worker
        let guard = self.inner.active.acquire();
        let job = Job::new(target, request, callback, guard);
        let job_id = job.id;

        match self.inner.queue.try_add(job) {
            Ok(()) => {
                self.inner.metrics.job_submitted();
                debug!(%job_id, "Job submitted");
                Ok(job_id)
            }
            Err(err) => {
                let reason = err.to_string();
                let job = err.into_inner();
                warn!(%job_id, uri = %job.target.uri(), reason = %reason, "Job rejected");
                self.inner.metrics.job_rejected();
                drop(job);
                Err(EngineError::Rejected(reason))
            }
        }
    }

    /// Wait until no job is queued or running
    ///
    /// Jobs submitted from callbacks keep the dispatcher busy: the child is
    /// counted before its parent finishes.
    pub async fn await_idleness(&self) {
        self.inner.active.wait_idle().await;
    }

    /// Like [`await_idleness`](Self::await_idleness) with a time limit;
    /// returns whether idleness was reached
    pub async fn await_idleness_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.await_idleness())
            .await
            .is_ok()
    }

    /// Stop accepting jobs; queued and running jobs still complete
    pub fn shutdown(&self) {
        info!(active = self.active_jobs(), "Dispatcher shutting down");
        self.inner.queue.shutdown();
    }

    /// Stop accepting jobs and abandon the ones not started yet
    ///
    /// Running jobs are not interrupted. Abandoned callbacks are never
    /// invoked. Returns how many jobs were abandoned.
    pub async fn shutdown_now(&self) -> usize {
        self.inner.queue.shutdown();
        self.inner.cancel.cancel();

        let abandoned = self.inner.queue.drain().await;
        let count = abandoned.len();
        for job in &abandoned {
            debug!(job_id = %job.id, uri = %job.target.uri(), "Job abandoned");
        }
        drop(abandoned);

        self.inner.metrics.jobs_abandoned(count as u64);
        warn!(abandoned = count, "Dispatcher shut down immediately");
        count
    }

    /// Wait for every worker to exit after a shutdown; returns whether they
    /// all did within `timeout`
    pub async fn await_termination(&self, timeout: Duration) -> bool {
        let mut workers = self.inner.workers.lock().await;

        let joined = tokio::time::timeout(timeout, async {
            while let Some(result) = workers.join_next().await {
                if let Err(e) = result {
                    error!(error = %e, "Worker task failed");
                }
            }
        })
        .await;

        joined.is_ok()
    }

    /// Jobs queued or running
    pub fn active_jobs(&self) -> usize {
        self.inner.active.current()
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.queue.is_shutdown()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }
}
