//! In-memory fetcher serving a fixed set of resources

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use std::collections::HashMap;
use std::time::Duration;

use super::traits::UriFetcher;
use super::types::{FetchFailure, FetchRequest, FetchResponse, UriAndContext};

/// Serves registered locators with status 200 and everything else with 404
#[derive(Debug, Clone, Default)]
pub struct FixedFetcher {
    resources: HashMap<Url, Bytes>,
    delay: Option<Duration>,
}

impl FixedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, uri: Url, content: impl Into<Bytes>) -> Self {
        self.resources.insert(uri, content.into());
        self
    }

    /// Simulated latency applied to every fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl UriFetcher for FixedFetcher {
    async fn fetch(&self, target: &UriAndContext, _request: &FetchRequest) -> FetchResponse {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.resources.get(target.uri()) {
            Some(content) => FetchResponse::success(target.clone(), Some(200), content.clone()),
            None => FetchResponse::failure(
                target.clone(),
                FetchFailure::with_status(format!("no resource registered for {}", target.uri()), 404),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_and_unknown_resources() {
        let known = Url::parse("http://foo/").unwrap();
        let unknown = Url::parse("http://bar/").unwrap();
        let fetcher = FixedFetcher::new().with_resource(known.clone(), "payload");

        let ok = fetcher.get(&known.into()).await;
        assert!(ok.is_success());
        assert_eq!(ok.content_text().as_deref(), Some("payload"));

        let missing = fetcher.get(&unknown.into()).await;
        assert!(!missing.is_success());
        assert_eq!(missing.status(), Some(404));
    }
}
