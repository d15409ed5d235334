use bon::Builder;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Caller bookkeeping carried through a fetch
pub type Context = BTreeMap<String, Value>;

/// Form fields for url-encoded POST bodies
pub type FormFields = BTreeMap<String, String>;

/// Target locator plus an opaque caller context
///
/// Equality, ordering and hashing only look at the locator: two targets with
/// the same URI and different contexts are the same target.
#[derive(Debug, Clone, Builder)]
pub struct UriAndContext {
    uri: Url,
    #[builder(default)]
    context: Context,
}

impl UriAndContext {
    pub fn new(uri: Url) -> Self {
        Self {
            uri,
            context: Context::new(),
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    /// Returns a copy of this target with one more context entry
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

impl From<Url> for UriAndContext {
    fn from(uri: Url) -> Self {
        Self::new(uri)
    }
}

impl PartialEq for UriAndContext {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for UriAndContext {}

impl Hash for UriAndContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}

impl PartialOrd for UriAndContext {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UriAndContext {
    fn cmp(&self, other: &Self) -> Ordering {
        self.uri.cmp(&other.uri)
    }
}

impl fmt::Display for UriAndContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}

/// Body of a POST request
#[derive(Debug, Clone)]
pub enum PostBody {
    Bytes(Bytes),
    Form(FormFields),
}

/// Operation performed for a job
#[derive(Debug, Clone, Default)]
pub enum FetchRequest {
    #[default]
    Get,
    Post(PostBody),
}

impl FetchRequest {
    pub fn method(&self) -> &'static str {
        match self {
            FetchRequest::Get => "GET",
            FetchRequest::Post(_) => "POST",
        }
    }
}

/// Why a fetch did not produce content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub message: String,
    pub status: Option<u16>,
}

impl FetchFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {})", self.message, status),
            None => f.write_str(&self.message),
        }
    }
}

/// Outcome of a fetch: content on success, a cause on failure
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Success { status: Option<u16>, content: Bytes },
    Failure(FetchFailure),
}

/// Result of a single fetch
#[derive(Debug, Clone)]
pub struct FetchResponse {
    target: UriAndContext,
    outcome: FetchOutcome,
    completed_at: DateTime<Utc>,
}

impl FetchResponse {
    pub fn success(target: UriAndContext, status: Option<u16>, content: impl Into<Bytes>) -> Self {
        Self {
            target,
            outcome: FetchOutcome::Success {
                status,
                content: content.into(),
            },
            completed_at: Utc::now(),
        }
    }

    pub fn failure(target: UriAndContext, cause: FetchFailure) -> Self {
        Self {
            target,
            outcome: FetchOutcome::Failure(cause),
            completed_at: Utc::now(),
        }
    }

    pub fn uri(&self) -> &Url {
        self.target.uri()
    }

    pub fn target(&self) -> &UriAndContext {
        &self.target
    }

    pub fn outcome(&self) -> &FetchOutcome {
        &self.outcome
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Success { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match &self.outcome {
            FetchOutcome::Success { status, .. } => *status,
            FetchOutcome::Failure(cause) => cause.status,
        }
    }

    pub fn content(&self) -> Option<&Bytes> {
        match &self.outcome {
            FetchOutcome::Success { content, .. } => Some(content),
            FetchOutcome::Failure(_) => None,
        }
    }

    /// Content decoded as UTF-8, replacing invalid sequences
    pub fn content_text(&self) -> Option<String> {
        self.content()
            .map(|content| String::from_utf8_lossy(content).into_owned())
    }

    pub fn failure_cause(&self) -> Option<&FetchFailure> {
        match &self.outcome {
            FetchOutcome::Success { .. } => None,
            FetchOutcome::Failure(cause) => Some(cause),
        }
    }

    pub fn into_parts(self) -> (UriAndContext, FetchOutcome) {
        (self.target, self.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_identity_ignores_context() {
        let plain = UriAndContext::new(url("http://foo/"));
        let with_ctx = UriAndContext::builder()
            .uri(url("http://foo/"))
            .context(Context::from([("depth".to_string(), json!(2))]))
            .build();

        assert_eq!(plain, with_ctx);

        let mut set = HashSet::new();
        set.insert(plain);
        assert!(!set.insert(with_ctx));
    }

    #[test]
    fn test_with_entry() {
        let target = UriAndContext::new(url("http://foo/"))
            .with_entry("source", "seed")
            .with_entry("depth", 1);

        assert_eq!(target.get("source"), Some(&json!("seed")));
        assert_eq!(target.get("depth"), Some(&json!(1)));
        assert!(target.get("missing").is_none());
    }

    #[test]
    fn test_success_has_content_only() {
        let response = FetchResponse::success(url("http://foo/").into(), Some(200), "hello");

        assert!(response.is_success());
        assert_eq!(response.content_text().as_deref(), Some("hello"));
        assert!(response.failure_cause().is_none());
        assert_eq!(response.status(), Some(200));
    }

    #[test]
    fn test_failure_has_cause_only() {
        let response = FetchResponse::failure(
            url("http://foo/").into(),
            FetchFailure::with_status("not found", 404),
        );

        assert!(!response.is_success());
        assert!(response.content().is_none());
        assert_eq!(response.status(), Some(404));
        assert_eq!(
            response.failure_cause().unwrap().to_string(),
            "not found (status 404)"
        );
    }

    #[test]
    fn test_request_method() {
        assert_eq!(FetchRequest::Get.method(), "GET");
        assert_eq!(
            FetchRequest::Post(PostBody::Form(FormFields::new())).method(),
            "POST"
        );
    }
}
