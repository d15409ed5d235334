use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::error::AnyError;
use crate::fetch::{FetchRequest, FetchResponse, UriAndContext};

/// Completion callback invoked with the job's response
pub type Callback = Box<dyn FnOnce(FetchResponse) -> Result<(), AnyError> + Send + 'static>;

/// Count of jobs submitted and not yet finished
///
/// Raised when a guard is created, lowered when it is dropped. Waiters are
/// woken every time the count returns to zero.
#[derive(Debug, Default)]
pub(crate) struct ActiveJobs {
    count: AtomicUsize,
    idle: Notify,
}

impl ActiveJobs {
    pub(crate) fn acquire(self: &Arc<Self>) -> ActiveJobGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        ActiveJobGuard {
            jobs: Arc::clone(self),
        }
    }

    pub(crate) fn current(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Wait until no job is active
    ///
    /// The notification is armed before the count is read, so a drop to zero
    /// between the read and the wait is not missed.
    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.current() == 0 {
                return;
            }

            notified.await;
        }
    }
}

/// Keeps one job counted as active for as long as it lives
#[derive(Debug)]
pub(crate) struct ActiveJobGuard {
    jobs: Arc<ActiveJobs>,
}

impl Drop for ActiveJobGuard {
    fn drop(&mut self) {
        if self.jobs.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.jobs.idle.notify_waiters();
        }
    }
}

/// A queued fetch plus its completion callback
pub(crate) struct Job {
    pub(crate) id: Uuid,
    pub(crate) target: UriAndContext,
    pub(crate) request: FetchRequest,
    pub(crate) callback: Callback,
    pub(crate) guard: ActiveJobGuard,
}

impl Job {
    pub(crate) fn new(
        target: UriAndContext,
        request: FetchRequest,
        callback: Callback,
        guard: ActiveJobGuard,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            target,
            request,
            callback,
            guard,
        }
    }
}
