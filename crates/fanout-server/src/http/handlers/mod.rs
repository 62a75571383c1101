//! HTTP request handlers.

mod batches;
mod health;

pub use batches::{async_http, async_tasks, sync_http};
pub use health::health_check;
