use super::models::{BulkConfig, Config, DispatcherConfig, HttpConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("dispatcher.workers must be at least 1")]
    NoWorkers,

    #[error("dispatcher.queue_capacity must be at least 1 when set")]
    ZeroQueueCapacity,

    #[error("Duration must be positive: {field}")]
    ZeroDuration { field: &'static str },

    #[error("bulk.max_concurrent must be at least 1")]
    NoBulkConcurrency,

    #[error("http.max_retries must be at least 1 (it counts the first attempt)")]
    NoAttempts,

    #[error("http.user_agent must not be empty")]
    EmptyUserAgent,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_dispatcher(&config.dispatcher)?;
    validate_bulk(&config.bulk)?;
    validate_http(&config.http)?;
    Ok(())
}

fn validate_dispatcher(dispatcher: &DispatcherConfig) -> Result<(), ValidationError> {
    if dispatcher.workers == 0 {
        return Err(ValidationError::NoWorkers);
    }

    if dispatcher.queue_capacity == Some(0) {
        return Err(ValidationError::ZeroQueueCapacity);
    }

    if dispatcher.poll_interval.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "dispatcher.poll_interval",
        });
    }

    Ok(())
}

fn validate_bulk(bulk: &BulkConfig) -> Result<(), ValidationError> {
    if bulk.max_concurrent == 0 {
        return Err(ValidationError::NoBulkConcurrency);
    }

    if bulk.task_timeout.is_some_and(|t| t.is_zero()) {
        return Err(ValidationError::ZeroDuration {
            field: "bulk.task_timeout",
        });
    }

    Ok(())
}

fn validate_http(http: &HttpConfig) -> Result<(), ValidationError> {
    if http.connect_timeout.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "http.connect_timeout",
        });
    }

    if http.request_timeout.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "http.request_timeout",
        });
    }

    if http.max_retries == 0 {
        return Err(ValidationError::NoAttempts);
    }

    if http.user_agent.trim().is_empty() {
        return Err(ValidationError::EmptyUserAgent);
    }

    Ok(())
}
