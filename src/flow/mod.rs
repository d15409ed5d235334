//! Typed transformation pipelines with per-kind error recovery
//!
//! A [`Flow`] runs an input through an ordered chain of [`Pipe`] stages on the
//! caller's task. When a stage fails, the [`ErrorHandler`] registered for the
//! failure's [`ErrorKind`] decides between recovery (the flow stops for this
//! input) and escalation (the error reaches the caller).
//!
//! ```
//! use fetchflow::flow::{ErrorKind, Flow, FlowOutcome, SkippingHandler, StageError, pipe_fn};
//!
//! let flow = Flow::builder(pipe_fn("parse", |s: String| {
//!     s.parse::<i64>().map_err(|e| StageError::new(ErrorKind::Parse, e))
//! }))
//! .pipe(pipe_fn("double", |n: i64| Ok(n * 2)))
//! .on(ErrorKind::Parse, SkippingHandler)
//! .build();
//!
//! assert_eq!(flow.execute("21".to_string()).unwrap(), FlowOutcome::Completed(42));
//! assert!(!flow.execute("x".to_string()).unwrap().is_completed());
//! ```

mod error;
mod handler;
mod pipe;
mod registry;

pub use error::{ErrorKind, StageError};
pub use handler::{ErrorHandler, EscalatingHandler, SkippingHandler};
pub use pipe::{FnPipe, Pipe, pipe_fn};
pub use registry::HandlerRegistry;

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use pipe::{Chain, Stage};

/// Result of a flow run that did not escalate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome<O> {
    /// Every stage ran
    Completed(O),
    /// A stage failed and a handler recovered; later stages were skipped
    Recovered {
        kind: ErrorKind,
        stage: Option<String>,
    },
}

impl<O> FlowOutcome<O> {
    pub fn is_completed(&self) -> bool {
        matches!(self, FlowOutcome::Completed(_))
    }

    pub fn into_output(self) -> Option<O> {
        match self {
            FlowOutcome::Completed(output) => Some(output),
            FlowOutcome::Recovered { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("unhandled stage failure: {0}")]
    Unhandled(#[source] StageError),
}

impl FlowError {
    pub fn stage_error(&self) -> &StageError {
        match self {
            FlowError::Unhandled(err) => err,
        }
    }
}

/// Immutable pipeline from `I` to `O`
pub struct Flow<I, O> {
    chain: Box<dyn Pipe<I, O>>,
    handlers: HandlerRegistry,
    default_handler: Arc<dyn ErrorHandler>,
    stages: Vec<String>,
}

impl<I: 'static, O: 'static> Flow<I, O> {
    /// Start a flow whose first stage is `first`
    pub fn builder(first: impl Pipe<I, O> + 'static) -> FlowBuilder<I, O> {
        let stages = vec![first.name().to_string()];
        FlowBuilder {
            chain: Box::new(Stage::new(first)),
            handlers: HandlerRegistry::new(),
            default_handler: Arc::new(EscalatingHandler),
            stages,
        }
    }
}

impl<I, O> Flow<I, O> {
    /// Run `input` through every stage in order
    pub fn execute(&self, input: I) -> Result<FlowOutcome<O>, FlowError> {
        match self.chain.execute(input) {
            Ok(output) => Ok(FlowOutcome::Completed(output)),
            Err(err) => self.recover(err),
        }
    }

    fn recover(&self, err: StageError) -> Result<FlowOutcome<O>, FlowError> {
        let kind = err.kind();
        let stage = err.stage().map(str::to_owned);
        warn!(%kind, stage = stage.as_deref(), error = %err, "Stage failed");

        let handler = match self.handlers.get(kind) {
            Some(handler) => handler,
            None => {
                debug!(%kind, "No handler registered, using default");
                &self.default_handler
            }
        };

        match handler.handle(err) {
            Ok(()) => {
                info!(%kind, stage = stage.as_deref(), "Flow stopped after recovered failure");
                Ok(FlowOutcome::Recovered { kind, stage })
            }
            Err(err) => Err(FlowError::Unhandled(err)),
        }
    }

    /// Stage names in execution order
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }
}

impl<I, O> std::fmt::Debug for Flow<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("stages", &self.stages)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Flow`]; the handler registry is only mutable here
pub struct FlowBuilder<I, O> {
    chain: Box<dyn Pipe<I, O>>,
    handlers: HandlerRegistry,
    default_handler: Arc<dyn ErrorHandler>,
    stages: Vec<String>,
}

impl<I: 'static, O: 'static> FlowBuilder<I, O> {
    /// Append a stage consuming the current output
    pub fn pipe<N: 'static>(mut self, next: impl Pipe<O, N> + 'static) -> FlowBuilder<I, N> {
        self.stages.push(next.name().to_string());
        let next: Box<dyn Pipe<O, N>> = Box::new(Stage::new(next));

        FlowBuilder {
            chain: Box::new(Chain::new(self.chain, next)),
            handlers: self.handlers,
            default_handler: self.default_handler,
            stages: self.stages,
        }
    }

    /// Handle failures tagged `kind` with `handler`
    pub fn on(mut self, kind: ErrorKind, handler: impl ErrorHandler + 'static) -> Self {
        self.handlers.register(kind, Arc::new(handler));
        self
    }

    /// Replace the handler used for kinds without a registration
    pub fn default_handler(mut self, handler: impl ErrorHandler + 'static) -> Self {
        self.default_handler = Arc::new(handler);
        self
    }

    pub fn build(self) -> Flow<I, O> {
        debug!(stages = ?self.stages, handlers = ?self.handlers, "Flow built");
        Flow {
            chain: self.chain,
            handlers: self.handlers,
            default_handler: self.default_handler,
            stages: self.stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_flow() -> FlowBuilder<String, i64> {
        Flow::builder(pipe_fn("parse", |s: String| {
            s.parse::<i64>()
                .map_err(|e| StageError::new(ErrorKind::Parse, e))
        }))
    }

    #[test]
    fn test_completed_outcome() {
        let flow = parse_flow()
            .pipe(pipe_fn("negate", |n: i64| Ok(-n)))
            .build();

        assert_eq!(flow.stages(), ["parse", "negate"]);
        assert_eq!(flow.execute("7".into()).unwrap(), FlowOutcome::Completed(-7));
    }

    #[test]
    fn test_default_handler_escalates() {
        let flow = parse_flow().build();

        let err = flow.execute("seven".into()).unwrap_err();
        assert_eq!(err.stage_error().kind(), ErrorKind::Parse);
        assert_eq!(err.stage_error().stage(), Some("parse"));
    }

    #[test]
    fn test_registered_handler_recovers() {
        let flow = parse_flow().on(ErrorKind::Parse, SkippingHandler).build();

        let outcome = flow.execute("seven".into()).unwrap();
        assert_eq!(
            outcome,
            FlowOutcome::Recovered {
                kind: ErrorKind::Parse,
                stage: Some("parse".into())
            }
        );
        assert_eq!(outcome.into_output(), None);
    }

    #[test]
    fn test_handler_for_other_kind_is_not_used() {
        let flow = parse_flow().on(ErrorKind::Io, SkippingHandler).build();
        assert!(flow.execute("seven".into()).is_err());
    }

    #[test]
    fn test_registered_handler_may_escalate() {
        let flow = parse_flow()
            .on(ErrorKind::Parse, |err: StageError| -> Result<(), StageError> { Err(err) })
            .default_handler(SkippingHandler)
            .build();

        assert!(flow.execute("seven".into()).is_err());
    }
}
