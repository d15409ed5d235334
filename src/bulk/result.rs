use reqwest::Url;
use std::collections::BTreeMap;

use crate::fetch::FetchResponse;

/// Responses of a bulk fetch keyed by locator
///
/// Holds one entry per distinct locator submitted; `successful` and `failed`
/// partition the entries by outcome.
#[derive(Debug, Clone, Default)]
pub struct BulkResult {
    details: BTreeMap<Url, FetchResponse>,
}

impl BulkResult {
    pub fn from_responses(responses: impl IntoIterator<Item = FetchResponse>) -> Self {
        let details = responses
            .into_iter()
            .map(|response| (response.uri().clone(), response))
            .collect();
        Self { details }
    }

    pub fn details(&self) -> &BTreeMap<Url, FetchResponse> {
        &self.details
    }

    pub fn get(&self, uri: &Url) -> Option<&FetchResponse> {
        self.details.get(uri)
    }

    pub fn successful(&self) -> Vec<&FetchResponse> {
        self.details.values().filter(|r| r.is_success()).collect()
    }

    pub fn failed(&self) -> Vec<&FetchResponse> {
        self.details.values().filter(|r| !r.is_success()).collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.details.values().all(FetchResponse::is_success)
    }

    pub fn len(&self) -> usize {
        self.details.len()
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    pub fn remove(&mut self, uri: &Url) -> Option<FetchResponse> {
        self.details.remove(uri)
    }

    pub fn into_details(self) -> BTreeMap<Url, FetchResponse> {
        self.details
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchFailure;

    #[test]
    fn test_partition_by_outcome() {
        let ok = Url::parse("http://ok/").unwrap();
        let bad = Url::parse("http://bad/").unwrap();

        let result = BulkResult::from_responses([
            FetchResponse::success(ok.clone().into(), Some(200), "fine"),
            FetchResponse::failure(bad.clone().into(), FetchFailure::new("refused")),
        ]);

        assert_eq!(result.len(), 2);
        assert_eq!(result.successful().len(), 1);
        assert_eq!(result.failed().len(), 1);
        assert_eq!(result.failed()[0].uri(), &bad);
        assert!(result.get(&ok).unwrap().is_success());
        assert!(!result.all_succeeded());
    }

    #[test]
    fn test_empty_result() {
        let result = BulkResult::default();
        assert!(result.is_empty());
        assert!(result.all_succeeded());
        assert!(result.successful().is_empty());
    }
}
