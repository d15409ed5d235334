//! Worker loop - pulls jobs off the queue, fetches, runs callbacks

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use super::job::Job;
use crate::fetch::{FetchFailure, FetchResponse, UriFetcher};
use crate::observability::Metrics;
use crate::queue::JobQueue;

pub(crate) struct Worker {
    pub(crate) id: usize,
    pub(crate) queue: Arc<JobQueue<Job>>,
    pub(crate) fetcher: Arc<dyn UriFetcher>,
    pub(crate) metrics: Arc<Metrics>,
    pub(crate) cancel: CancellationToken,
}

impl Worker {
    /// Run until the queue terminates or the worker is cancelled
    pub(crate) async fn run(self) {
        debug!(worker_id = self.id, "Worker started");

        loop {
            let job = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(worker_id = self.id, "Worker cancelled");
                    break;
                }
                job = self.queue.poll() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            self.execute(job).await;
        }

        debug!(worker_id = self.id, "Worker stopped");
    }

    /// Fetch and run the callback; nothing raised here escapes the job
    async fn execute(&self, job: Job) {
        let Job {
            id,
            target,
            request,
            callback,
            guard,
        } = job;
        let uri = target.uri().clone();

        trace!(worker_id = self.id, job_id = %id, %uri, method = request.method(), "Executing job");

        let fetched = AssertUnwindSafe(self.fetcher.fetch(&target, &request))
            .catch_unwind()
            .await;

        let response = match fetched {
            Ok(response) => response,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(job_id = %id, %uri, panic = %message, "Fetcher panicked");
                FetchResponse::failure(target, FetchFailure::new(format!("fetcher panicked: {message}")))
            }
        };

        match std::panic::catch_unwind(AssertUnwindSafe(move || callback(response))) {
            Ok(Ok(())) => {
                trace!(job_id = %id, %uri, "Callback completed");
            }
            Ok(Err(err)) => {
                error!(job_id = %id, %uri, error = %err, "Error while processing callback");
                self.metrics.callback_failed();
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(job_id = %id, %uri, panic = %message, "Callback panicked");
                self.metrics.callback_failed();
            }
        }

        self.metrics.job_completed();

        // the job stays active until its callback has finished
        drop(guard);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
