use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub bulk: BulkConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Async dispatcher worker pool and job queue
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatcherConfig {
    /// Number of worker tasks executing jobs
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Bounded queue capacity; unbounded when absent
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    /// How often an idle worker re-checks the queue's shutdown state
    #[serde(default = "default_poll_interval")]
    pub poll_interval: HumanDuration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: None,
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_poll_interval() -> HumanDuration {
    HumanDuration::from_millis(500)
}

/// Bulk fetch coordinator
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BulkConfig {
    /// Fetches allowed to run at once across every bulk call sharing the pool
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Per-task time limit; a task over the limit yields a failure response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_timeout: Option<HumanDuration>,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            task_timeout: None,
        }
    }
}

fn default_max_concurrent() -> usize {
    16
}

/// HTTP transport
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    /// Total attempts per fetch, including the first one
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay between attempts, doubled after each failure
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: HumanDuration,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            request_timeout: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: default_retry_backoff(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(60)
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> HumanDuration {
    HumanDuration::from_secs(1)
}

fn default_max_redirects() -> usize {
    10
}

fn default_user_agent() -> String {
    "fetchflow/0.1.0".to_string()
}
