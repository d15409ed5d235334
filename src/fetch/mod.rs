//! Fetch collaborators and the data they exchange
//!
//! - [`UriFetcher`] - transport trait consumed by the dispatcher and bulk fetcher
//! - [`HttpFetcher`] - reqwest-backed transport
//! - [`FixedFetcher`] - in-memory transport for tests and demos
//! - [`UriAndContext`], [`FetchRequest`], [`FetchResponse`] - request and result types

pub mod fixed;
pub mod http;
mod traits;
mod types;

pub use fixed::FixedFetcher;
pub use http::{FetchError, HttpFetcher};
pub use traits::UriFetcher;
pub use types::{
    Context, FetchFailure, FetchOutcome, FetchRequest, FetchResponse, FormFields, PostBody,
    UriAndContext,
};
