//! HTTP response types.
//!
//! Everything here is derived from a [`BatchSummary`]; durations are
//! rendered with [`to_human_readable`].

use serde::Serialize;

use fanout_core::{to_human_readable, BatchSummary, TaskResult};

// ============================================================================
// Error types
// ============================================================================

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Batch types
// ============================================================================

/// Timing of one simulated task.
#[derive(Debug, Serialize)]
pub struct TaskTimingResponse {
    pub name: String,
    pub execution_time: String,
}

/// Response for the simulated-task batch.
#[derive(Debug, Serialize)]
pub struct TasksResponse {
    pub message: String,
    pub batch_id: String,
    pub tasks: Vec<TaskTimingResponse>,
    pub total_execution_time: String,
    pub errors_count: usize,
}

impl<T> From<&BatchSummary<T>> for TasksResponse {
    fn from(summary: &BatchSummary<T>) -> Self {
        Self {
            message: completion_message("All async tasks", summary.failure_count()),
            batch_id: summary.batch_id().to_string(),
            tasks: summary
                .per_task()
                .iter()
                .map(|r| TaskTimingResponse {
                    name: r.name.clone(),
                    execution_time: to_human_readable(r.duration_ms),
                })
                .collect(),
            total_execution_time: to_human_readable(summary.total_duration_ms()),
            errors_count: summary.failure_count(),
        }
    }
}

/// Timing of one fetched URL.
#[derive(Debug, Serialize)]
pub struct RequestTimingResponse {
    pub url: String,
    pub execution_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<&TaskResult<T>> for RequestTimingResponse {
    fn from(result: &TaskResult<T>) -> Self {
        Self {
            url: result.name.clone(),
            execution_time: to_human_readable(result.duration_ms),
            error: result.reason().map(str::to_owned),
        }
    }
}

/// Response for the fetch batches.
#[derive(Debug, Serialize)]
pub struct RequestsResponse {
    pub message: String,
    pub batch_id: String,
    pub requests: Vec<RequestTimingResponse>,
    pub total_execution_time: String,
    pub errors_count: usize,
}

impl<T> From<&BatchSummary<T>> for RequestsResponse {
    fn from(summary: &BatchSummary<T>) -> Self {
        Self {
            message: completion_message("All HTTP requests", summary.failure_count()),
            batch_id: summary.batch_id().to_string(),
            requests: summary.per_task().iter().map(Into::into).collect(),
            total_execution_time: to_human_readable(summary.total_duration_ms()),
            errors_count: summary.failure_count(),
        }
    }
}

fn completion_message(subject: &str, errors: usize) -> String {
    match errors {
        0 => format!("{subject} completed successfully."),
        n => format!("{subject} completed with {n} error(s)."),
    }
}
