use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::{debug, info};

/// Why a job was not accepted; the job is handed back to the caller
#[derive(Error)]
pub enum QueueError<T> {
    #[error("queue is shutting down, job rejected")]
    Rejected(T),

    #[error("queue is full, job rejected")]
    Full(T),
}

impl<T> QueueError<T> {
    pub fn into_inner(self) -> T {
        match self {
            QueueError::Rejected(job) | QueueError::Full(job) => job,
        }
    }
}

impl<T> fmt::Debug for QueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Rejected(_) => f.write_str("Rejected(..)"),
            QueueError::Full(_) => f.write_str("Full(..)"),
        }
    }
}

enum JobSender<T> {
    Bounded(mpsc::Sender<T>),
    Unbounded(mpsc::UnboundedSender<T>),
}

enum JobReceiver<T> {
    Bounded(mpsc::Receiver<T>),
    Unbounded(mpsc::UnboundedReceiver<T>),
}

impl<T> JobReceiver<T> {
    async fn recv(&mut self) -> Option<T> {
        match self {
            JobReceiver::Bounded(rx) => rx.recv().await,
            JobReceiver::Unbounded(rx) => rx.recv().await,
        }
    }

    fn try_recv(&mut self) -> Result<T, TryRecvError> {
        match self {
            JobReceiver::Bounded(rx) => rx.try_recv(),
            JobReceiver::Unbounded(rx) => rx.try_recv(),
        }
    }
}

/// Shutdown-aware job queue shared by a pool of workers
///
/// Lifecycle: running, then draining once [`shutdown`](Self::shutdown) is
/// called (queued jobs are still handed out), then terminated when it is both
/// shut down and empty (every [`poll`](Self::poll) returns `None`).
///
/// `queued` is raised before a job enters the channel and lowered when it
/// leaves, so a submission racing with `shutdown` is either rejected or seen
/// by `poll` and `drain` as pending work.
pub struct JobQueue<T> {
    sender: JobSender<T>,
    receiver: Mutex<JobReceiver<T>>,
    shutdown: AtomicBool,
    queued: AtomicUsize,
    wake_interval: Duration,
}

impl<T: Send> JobQueue<T> {
    /// Unbounded queue
    pub fn unbounded(wake_interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self::from_parts(JobSender::Unbounded(tx), JobReceiver::Unbounded(rx), wake_interval)
    }

    /// Queue holding at most `capacity` jobs; `add` waits for room
    pub fn bounded(capacity: usize, wake_interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self::from_parts(JobSender::Bounded(tx), JobReceiver::Bounded(rx), wake_interval)
    }

    /// Bounded when a capacity is given, unbounded otherwise
    pub fn with_capacity(capacity: Option<usize>, wake_interval: Duration) -> Self {
        match capacity {
            Some(capacity) => Self::bounded(capacity, wake_interval),
            None => Self::unbounded(wake_interval),
        }
    }

    fn from_parts(sender: JobSender<T>, receiver: JobReceiver<T>, wake_interval: Duration) -> Self {
        Self {
            sender,
            receiver: Mutex::new(receiver),
            shutdown: AtomicBool::new(false),
            queued: AtomicUsize::new(0),
            wake_interval: wake_interval.max(Duration::from_millis(1)),
        }
    }

    /// Add a job, waiting for room if the queue is bounded and full
    pub async fn add(&self, job: T) -> Result<(), QueueError<T>> {
        if !self.reserve_slot() {
            return Err(QueueError::Rejected(job));
        }

        let job = match &self.sender {
            JobSender::Bounded(tx) => tx.send(job).await.map_err(|e| e.0),
            JobSender::Unbounded(tx) => tx.send(job).map_err(|e| e.0),
        };

        if let Err(job) = job {
            self.release_slot();
            return Err(QueueError::Rejected(job));
        }

        Ok(())
    }

    /// Add a job without waiting
    pub fn try_add(&self, job: T) -> Result<(), QueueError<T>> {
        if !self.reserve_slot() {
            return Err(QueueError::Rejected(job));
        }

        self.push_reserved(job)
    }

    /// Send a job whose slot is already reserved
    fn push_reserved(&self, job: T) -> Result<(), QueueError<T>> {
        let sent = match &self.sender {
            JobSender::Bounded(tx) => tx.try_send(job).map_err(|e| match e {
                TrySendError::Full(job) => QueueError::Full(job),
                TrySendError::Closed(job) => QueueError::Rejected(job),
            }),
            JobSender::Unbounded(tx) => tx.send(job).map_err(|e| QueueError::Rejected(e.0)),
        };

        if sent.is_err() {
            self.release_slot();
        }

        sent
    }

    /// Wait for the next job
    ///
    /// Returns `None` once the queue is shut down and empty: the caller should
    /// stop working. While idle, the shutdown state is re-checked every wake
    /// interval.
    pub async fn poll(&self) -> Option<T> {
        let mut receiver = self.receiver.lock().await;

        loop {
            match receiver.try_recv() {
                Ok(job) => {
                    self.release_slot();
                    return Some(job);
                }
                Err(TryRecvError::Disconnected) => return None,
                Err(TryRecvError::Empty) => {}
            }

            if self.is_shutdown() && self.is_empty() {
                debug!("Queue shut down and drained");
                return None;
            }

            match tokio::time::timeout(self.wake_interval, receiver.recv()).await {
                Ok(Some(job)) => {
                    self.release_slot();
                    return Some(job);
                }
                Ok(None) => return None,
                Err(_) => continue,
            }
        }
    }

    /// Remove and return every job still queued
    ///
    /// After shutdown this also waits for submissions that reserved a slot
    /// before the flag flipped but have not reached the channel yet.
    pub async fn drain(&self) -> Vec<T> {
        let mut receiver = self.receiver.lock().await;
        let mut drained = Vec::new();

        loop {
            while let Ok(job) = receiver.try_recv() {
                self.release_slot();
                drained.push(job);
            }

            if !self.is_shutdown() || self.is_empty() {
                break;
            }

            match tokio::time::timeout(self.wake_interval, receiver.recv()).await {
                Ok(Some(job)) => {
                    self.release_slot();
                    drained.push(job);
                }
                Ok(None) => break,
                Err(_) => continue,
            }
        }

        drained
    }

    /// Stop accepting jobs; queued jobs are still delivered
    pub fn shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            info!(queued = self.len(), "Job queue shutting down");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Jobs accepted but not yet handed out
    pub fn len(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn reserve_slot(&self) -> bool {
        self.queued.fetch_add(1, Ordering::SeqCst);
        if self.is_shutdown() {
            self.release_slot();
            return false;
        }
        true
    }

    fn release_slot(&self) {
        self.queued.fetch_sub(1, Ordering::SeqCst);
    }
}
