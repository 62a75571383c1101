//! Fanout Server Library
//!
//! Runs batches of independent work items concurrently, times each one
//! and reports a summary once all of them have finished, tolerating
//! individual failures. The HTTP layer exposes simulated-delay and
//! URL-fetch batches.

pub mod config;
pub mod coordinator;
pub mod fetch;
pub mod http;
pub mod state;

pub use config::Config;
pub use coordinator::{Coordinator, WorkItem};
pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use state::AppState;
