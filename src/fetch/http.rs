//! HTTP transport for fetching resources

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::{debug, warn};

use super::traits::UriFetcher;
use super::types::{FetchFailure, FetchRequest, FetchResponse, PostBody, UriAndContext};
use crate::config::HttpConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Too many redirects")]
    TooManyRedirects,

    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },
}

impl FetchError {
    /// Client errors are not worth another attempt
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => *status >= 500,
            FetchError::InvalidUrl(_) | FetchError::TooManyRedirects => false,
            FetchError::RequestFailed(_) | FetchError::Timeout => true,
        }
    }

    fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// reqwest-backed [`UriFetcher`]
pub struct HttpFetcher {
    client: Client,
    config: HttpConfig,
}

impl HttpFetcher {
    /// Create a new HTTP fetcher
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout.as_duration())
            .timeout(config.request_timeout.as_duration())
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Fetch with retry and exponential backoff
    async fn fetch_with_retry(&self, url: &Url, request: &FetchRequest) -> Result<(u16, Bytes)> {
        let max_attempts = self.config.max_retries.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.fetch_once(url, request).await {
                Ok(fetched) => {
                    if attempts > 1 {
                        debug!(%url, attempts, "Fetch succeeded after retry");
                    }
                    return Ok(fetched);
                }
                Err(e) if !e.is_retryable() || attempts >= max_attempts => {
                    warn!(%url, attempts, error = %e, "Fetch failed");
                    return Err(e);
                }
                Err(e) => {
                    warn!(%url, attempts, error = %e, "Fetch failed, retrying");

                    // base, 2x base, 4x base...
                    let backoff = self.config.retry_backoff.as_duration() * 2u32.pow(attempts - 1);
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    /// Fetch once (no retry)
    async fn fetch_once(&self, url: &Url, request: &FetchRequest) -> Result<(u16, Bytes)> {
        debug!(%url, method = request.method(), "Starting fetch");

        let builder = match request {
            FetchRequest::Get => self.client.get(url.clone()),
            FetchRequest::Post(PostBody::Bytes(body)) => {
                self.client.post(url.clone()).body(body.clone())
            }
            FetchRequest::Post(PostBody::Form(fields)) => self.client.post(url.clone()).form(fields),
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else if e.is_redirect() {
                FetchError::TooManyRedirects
            } else if e.is_builder() {
                FetchError::InvalidUrl(e.to_string())
            } else {
                FetchError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::RequestFailed(format!("Failed to read body: {}", e)))?;

        debug!(%url, size = bytes.len(), "Fetch completed");

        Ok((status.as_u16(), bytes))
    }
}

#[async_trait]
impl UriFetcher for HttpFetcher {
    async fn fetch(&self, target: &UriAndContext, request: &FetchRequest) -> FetchResponse {
        match self.fetch_with_retry(target.uri(), request).await {
            Ok((status, content)) => FetchResponse::success(target.clone(), Some(status), content),
            Err(e) => {
                let cause = FetchFailure {
                    message: e.to_string(),
                    status: e.status(),
                };
                FetchResponse::failure(target.clone(), cause)
            }
        }
    }
}
