use std::fmt;
use thiserror::Error;

use crate::error::AnyError;

/// Closed set of failure tags; handlers are registered per tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    InvalidInput,
    Parse,
    Transform,
    NotFound,
    Io,
    Timeout,
    Fetch,
    Other,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::InvalidInput,
        ErrorKind::Parse,
        ErrorKind::Transform,
        ErrorKind::NotFound,
        ErrorKind::Io,
        ErrorKind::Timeout,
        ErrorKind::Fetch,
        ErrorKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Parse => "parse",
            ErrorKind::Transform => "transform",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Io => "io",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Fetch => "fetch",
            ErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure raised by a pipeline stage
#[derive(Debug, Error)]
#[error("{kind} failure in stage {}: {source}", .stage.as_deref().unwrap_or("<unnamed>"))]
pub struct StageError {
    kind: ErrorKind,
    stage: Option<String>,
    source: AnyError,
}

impl StageError {
    pub fn new(kind: ErrorKind, source: impl Into<AnyError>) -> Self {
        Self {
            kind,
            stage: None,
            source: source.into(),
        }
    }

    /// Attribute the failure to `stage` unless it already names one
    pub fn in_stage(mut self, stage: impl Into<String>) -> Self {
        if self.stage.is_none() {
            self.stage = Some(stage.into());
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn stage(&self) -> Option<&str> {
        self.stage.as_deref()
    }

    pub fn into_source(self) -> AnyError {
        self.source
    }
}
