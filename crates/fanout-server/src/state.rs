//! Shared application state.

use std::sync::Arc;

use crate::config::Config;
use crate::fetch::Fetcher;

/// Span label of the simulated-task batch.
pub const ASYNC_TASKS_BATCH: &str = "async_tasks";

/// Span label of the concurrent fetch batch.
pub const ASYNC_HTTP_BATCH: &str = "http_requests";

/// Span label of the sequential fetch batch.
pub const SYNC_HTTP_BATCH: &str = "sync_http_requests";

/// Shared application state.
///
/// Holds no per-batch data: every request runs its own batch with its own
/// span registry.
pub struct AppState {
    /// Server configuration.
    pub config: Config,

    /// Network boundary used by the fetch endpoints.
    pub fetcher: Arc<dyn Fetcher>,
}

impl AppState {
    /// Create a new AppState wrapped in Arc.
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>) -> Arc<Self> {
        Arc::new(Self { config, fetcher })
    }
}
