pub mod bulk;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod flow;
pub mod humanize;
pub mod observability;
pub mod queue;

pub use bulk::{BulkFetcher, BulkResult};
pub use dispatcher::AsyncDispatcher;
pub use engine::FetchingEngine;
pub use error::{EngineError, Result};
