//! Fanout Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Async runtime specifics
//!
//! It provides the span [`Timer`], the per-task result model and the
//! duration formatter used when rendering a [`BatchSummary`].

pub mod error;
pub mod format;
pub mod ids;
pub mod status;
pub mod task;
pub mod timer;

// Re-export commonly used types
pub use error::{BatchError, SpanError};
pub use format::to_human_readable;
pub use ids::BatchId;
pub use status::TaskOutcome;
pub use task::{BatchSummary, TaskResult};
pub use timer::{SpanHandle, Timer};
