//! Per-task results and the batch summary built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BatchId, TaskOutcome};

/// Result of one unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult<T> {
    /// Work item name, unique within its batch.
    pub name: String,

    /// How the unit ended.
    pub outcome: TaskOutcome<T>,

    /// Elapsed time of the unit's span in milliseconds.
    pub duration_ms: f64,
}

impl<T> TaskResult<T> {
    /// Create a new TaskResult.
    pub fn new(name: impl Into<String>, outcome: TaskOutcome<T>, duration_ms: f64) -> Self {
        Self {
            name: name.into(),
            outcome,
            duration_ms: duration_ms.max(0.0),
        }
    }

    /// Returns true if the unit failed.
    pub fn is_failure(&self) -> bool {
        self.outcome.is_failure()
    }

    /// Failure reason, if the unit failed.
    pub fn reason(&self) -> Option<&str> {
        self.outcome.reason()
    }
}

/// Outcome of a whole batch.
///
/// Built once, after every unit is terminal. Fields are read-only so the
/// failure count always agrees with the per-task outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary<T> {
    batch_id: BatchId,
    started_at: DateTime<Utc>,
    total_duration_ms: f64,
    per_task: Vec<TaskResult<T>>,
    failure_count: usize,
}

impl<T> BatchSummary<T> {
    /// Assemble a summary. `per_task` must already be in submission order.
    pub fn new(
        batch_id: BatchId,
        started_at: DateTime<Utc>,
        total_duration_ms: f64,
        per_task: Vec<TaskResult<T>>,
    ) -> Self {
        let failure_count = per_task.iter().filter(|r| r.is_failure()).count();
        Self {
            batch_id,
            started_at,
            total_duration_ms: total_duration_ms.max(0.0),
            per_task,
            failure_count,
        }
    }

    pub fn batch_id(&self) -> &BatchId {
        &self.batch_id
    }

    /// Wall-clock time the batch started. Informational only.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Milliseconds from batch start until the last unit became terminal.
    pub fn total_duration_ms(&self) -> f64 {
        self.total_duration_ms
    }

    /// Results in submission order.
    pub fn per_task(&self) -> &[TaskResult<T>] {
        &self.per_task
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count
    }

    pub fn success_count(&self) -> usize {
        self.per_task.len() - self.failure_count
    }

    /// Returns true if no unit failed.
    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }

    /// Longest single unit duration, or 0 for an empty batch.
    pub fn max_task_duration_ms(&self) -> f64 {
        self.per_task
            .iter()
            .map(|r| r.duration_ms)
            .fold(0.0, f64::max)
    }

    /// Look up a result by work item name.
    pub fn get(&self, name: &str) -> Option<&TaskResult<T>> {
        self.per_task.iter().find(|r| r.name == name)
    }

    /// Consume the summary, returning the per-task results.
    pub fn into_results(self) -> Vec<TaskResult<T>> {
        self.per_task
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(results: Vec<TaskResult<u32>>) -> BatchSummary<u32> {
        BatchSummary::new(BatchId::new("b-1"), Utc::now(), 50.0, results)
    }

    #[test]
    fn test_failure_count_matches_outcomes() {
        let s = summary(vec![
            TaskResult::new("a", TaskOutcome::Success(1), 10.0),
            TaskResult::new("b", TaskOutcome::failure("status 404"), 5.0),
            TaskResult::new("c", TaskOutcome::Success(3), 40.0),
        ]);

        assert_eq!(s.failure_count(), 1);
        assert_eq!(s.success_count(), 2);
        assert!(!s.is_success());
        assert_eq!(s.get("b").and_then(|r| r.reason()), Some("status 404"));
        assert_eq!(s.max_task_duration_ms(), 40.0);
    }

    #[test]
    fn test_empty_summary() {
        let s = summary(Vec::new());

        assert!(s.per_task().is_empty());
        assert_eq!(s.failure_count(), 0);
        assert!(s.is_success());
        assert_eq!(s.max_task_duration_ms(), 0.0);
    }

    #[test]
    fn test_preserves_given_order() {
        let s = summary(vec![
            TaskResult::new("second", TaskOutcome::Success(2), 1.0),
            TaskResult::new("first", TaskOutcome::Success(1), 2.0),
        ]);

        let names: Vec<_> = s.per_task().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["second", "first"]);
    }
}
