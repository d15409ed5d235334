use thiserror::Error;

/// Boxed error returned by completion callbacks
pub type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Queue or pool refused new work (shut down or full)
    #[error("submission rejected: {0}")]
    Rejected(String),

    /// A bulk task ended without producing a response
    #[error("bulk aggregation failed: {message}")]
    Aggregation {
        message: String,
        #[source]
        source: Option<tokio::task::JoinError>,
    },

    #[error("not implemented: {0}")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, EngineError>;
