use async_trait::async_trait;

use super::types::{FetchRequest, FetchResponse, UriAndContext};

/// Transport collaborator performing a single fetch
///
/// Implementations never fail: transport and application errors are encoded
/// into a failure-status [`FetchResponse`].
#[async_trait]
pub trait UriFetcher: Send + Sync {
    async fn fetch(&self, target: &UriAndContext, request: &FetchRequest) -> FetchResponse;

    async fn get(&self, target: &UriAndContext) -> FetchResponse {
        self.fetch(target, &FetchRequest::Get).await
    }
}
