use tracing::{error, warn};

use super::error::StageError;

/// Recovery logic for a failed stage
///
/// `Ok(())` recovers: the flow stops for this input and reports the recovery.
/// Returning the error escalates it to the caller of `Flow::execute`.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, error: StageError) -> Result<(), StageError>;
}

impl<F> ErrorHandler for F
where
    F: Fn(StageError) -> Result<(), StageError> + Send + Sync,
{
    fn handle(&self, error: StageError) -> Result<(), StageError> {
        self(error)
    }
}

/// Logs at error level and escalates; the default for unregistered kinds
#[derive(Debug, Clone, Copy, Default)]
pub struct EscalatingHandler;

impl ErrorHandler for EscalatingHandler {
    fn handle(&self, err: StageError) -> Result<(), StageError> {
        error!(kind = %err.kind(), stage = err.stage(), error = %err, "No handler for stage failure");
        Err(err)
    }
}

/// Logs at warn level and recovers
#[derive(Debug, Clone, Copy, Default)]
pub struct SkippingHandler;

impl ErrorHandler for SkippingHandler {
    fn handle(&self, err: StageError) -> Result<(), StageError> {
        warn!(kind = %err.kind(), stage = err.stage(), error = %err, "Skipping input after stage failure");
        Ok(())
    }
}
