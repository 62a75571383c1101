//! Batch coordinator - fans work items out, waits for all, summarizes.
//!
//! Each [`WorkItem`] becomes a unit: a value carrying the item's name,
//! its operation, the batch timer and the channel through which it reports
//! its outcome. A unit opens its own span right before its operation
//! runs. The coordinator launches every unit, then waits on the channel
//! until every unit has dropped its sender. That is the join barrier: a
//! failing unit never cancels or short-circuits its siblings.

use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use chrono::Utc;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use fanout_core::{BatchError, BatchId, BatchSummary, TaskOutcome, TaskResult, Timer};

type Operation<T> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, String>> + Send>;

/// A named, zero-argument unit of work.
pub struct WorkItem<T> {
    name: String,
    operation: Operation<T>,
}

impl<T: Send + 'static> WorkItem<T> {
    /// Create a work item. The operation's error is reduced to its message.
    pub fn new<F, Fut, E>(name: impl Into<String>, operation: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display + 'static,
    {
        Self {
            name: name.into(),
            operation: Box::new(move || {
                async move { operation().await.map_err(|e| e.to_string()) }.boxed()
            }),
        }
    }
}

impl<T> WorkItem<T> {
    /// Work item name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> std::fmt::Debug for WorkItem<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkItem").field("name", &self.name).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Concurrent,
    Sequential,
}

/// Outcome reported by a unit, tagged with its submission index.
struct UnitReport<T> {
    index: usize,
    outcome: TaskOutcome<T>,
}

/// One launched work item.
struct Unit<T> {
    index: usize,
    batch_id: BatchId,
    scope: String,
    item: WorkItem<T>,
    timer: Timer,
    report: mpsc::UnboundedSender<UnitReport<T>>,
}

impl<T: Send + 'static> Unit<T> {
    async fn run(self) {
        let Unit {
            index,
            batch_id,
            scope,
            item,
            timer,
            report,
        } = self;
        let WorkItem { name, operation } = item;

        // Names were validated unique against a fresh timer, so this only
        // fails on a coordination bug; the task still reports an outcome.
        let span = match timer.start(name.clone(), Some(scope.as_str())) {
            Ok(span) => span,
            Err(e) => {
                error!(batch_id = %batch_id, task = %name, error = %e, "Failed to open task span");
                let outcome = TaskOutcome::failure(e.to_string());
                if report.send(UnitReport { index, outcome }).is_err() {
                    debug!(batch_id = %batch_id, task = %name, "Batch no longer awaiting results");
                }
                return;
            }
        };

        info!(batch_id = %batch_id, task = %name, "Starting task");

        // The operation is invoked inside the guarded future so a panic in
        // either the closure or the future becomes a Failure.
        let result = AssertUnwindSafe(async move { operation().await })
            .catch_unwind()
            .await;

        let outcome = match result {
            Ok(Ok(value)) => TaskOutcome::Success(value),
            Ok(Err(reason)) => TaskOutcome::failure(reason),
            Err(panic) => {
                TaskOutcome::failure(format!("operation panicked: {}", panic_message(&*panic)))
            }
        };

        // Runs on both paths.
        let duration_ms = match span.stop() {
            Ok(ms) => ms,
            Err(e) => {
                warn!(batch_id = %batch_id, task = %name, error = %e, "Failed to stop task span");
                0.0
            }
        };

        match outcome.reason() {
            Some(reason) => {
                error!(batch_id = %batch_id, task = %name, error = %reason, "Task failed")
            }
            None => info!(batch_id = %batch_id, task = %name, duration_ms, "Task completed"),
        }

        if report.send(UnitReport { index, outcome }).is_err() {
            debug!(batch_id = %batch_id, task = %name, "Batch no longer awaiting results");
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn validate<T>(items: &[WorkItem<T>]) -> Result<(), BatchError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.name.is_empty() {
            return Err(BatchError::EmptyWorkItemName);
        }
        if !seen.insert(item.name.as_str()) {
            return Err(BatchError::DuplicateWorkItem(item.name.clone()));
        }
    }
    Ok(())
}

/// Runs batches of work items and reports a [`BatchSummary`] per batch.
///
/// The coordinator holds no per-batch state: every call builds its own
/// [`Timer`], so concurrent batches never collide on span names.
#[derive(Debug, Clone)]
pub struct Coordinator {
    label: String,
}

impl Coordinator {
    /// Create a coordinator whose batch span is named `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Name of the top-level span every task span nests under.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run all items concurrently and wait for every one to finish.
    ///
    /// Operation failures (including panics) are captured per task; only
    /// contract violations such as duplicate names return `Err`, and they
    /// do so before any operation runs.
    pub async fn run_batch<T: Send + 'static>(
        &self,
        items: Vec<WorkItem<T>>,
    ) -> Result<BatchSummary<T>, BatchError> {
        self.execute(items, Mode::Concurrent).await
    }

    /// Run all items one after another, in submission order.
    ///
    /// Same contract as [`run_batch`](Self::run_batch); the total duration
    /// approximates the sum of the task durations instead of their maximum.
    pub async fn run_batch_sequential<T: Send + 'static>(
        &self,
        items: Vec<WorkItem<T>>,
    ) -> Result<BatchSummary<T>, BatchError> {
        self.execute(items, Mode::Sequential).await
    }

    async fn execute<T: Send + 'static>(
        &self,
        items: Vec<WorkItem<T>>,
        mode: Mode,
    ) -> Result<BatchSummary<T>, BatchError> {
        validate(&items)?;

        let batch_id = BatchId::generate();
        let timer = Timer::new();
        let started_at = Utc::now();
        let batch_span = timer.start(self.label.clone(), None)?;
        let names: Vec<String> = items.iter().map(|item| item.name.clone()).collect();

        info!(
            batch_id = %batch_id,
            batch = %self.label,
            tasks = names.len(),
            mode = ?mode,
            "Starting batch"
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let units: Vec<Unit<T>> = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| Unit {
                index,
                batch_id: batch_id.clone(),
                scope: self.label.clone(),
                item,
                timer: timer.clone(),
                report: tx.clone(),
            })
            .collect();
        drop(tx);

        match mode {
            Mode::Concurrent => {
                for unit in units {
                    tokio::spawn(unit.run());
                }
            }
            Mode::Sequential => {
                for unit in units {
                    unit.run().await;
                }
            }
        }

        // Join barrier: the channel closes once every unit has dropped its sender.
        let mut outcomes: Vec<Option<TaskOutcome<T>>> = names.iter().map(|_| None).collect();
        while let Some(report) = rx.recv().await {
            if let Some(slot) = outcomes.get_mut(report.index) {
                *slot = Some(report.outcome);
            }
        }

        let total_ms = batch_span.stop()?;

        let per_task = names
            .into_iter()
            .zip(outcomes)
            .map(|(name, outcome)| {
                // Only a unit torn down by runtime shutdown ends without
                // reporting; its span is missing or open, so charge it the whole batch.
                let outcome = outcome.unwrap_or_else(|| {
                    TaskOutcome::failure("unit terminated without reporting an outcome")
                });
                let duration_ms = timer
                    .scoped_duration(Some(self.label.as_str()), &name)
                    .unwrap_or(total_ms);
                TaskResult::new(name, outcome, duration_ms)
            })
            .collect();

        let summary = BatchSummary::new(batch_id, started_at, total_ms, per_task);

        info!(
            batch_id = %summary.batch_id(),
            batch = %self.label,
            total_ms = summary.total_duration_ms(),
            errors = summary.failure_count(),
            "Batch completed"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const UNIT_MS: u64 = 40;

    fn delayed(name: &str, units: u64) -> WorkItem<u64> {
        WorkItem::new(name, move || async move {
            tokio::time::sleep(Duration::from_millis(units * UNIT_MS)).await;
            Ok::<_, String>(units)
        })
    }

    fn failing(name: &str, reason: &'static str) -> WorkItem<u64> {
        WorkItem::new(name, move || async move { Err::<u64, _>(reason) })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_total_tracks_max_not_sum() {
        let coordinator = Coordinator::new("async_tasks");
        let items = vec![
            delayed("task1", 5),
            delayed("task2", 3),
            delayed("task3", 2),
            delayed("task4", 0),
        ];

        let summary = coordinator.run_batch(items).await.unwrap();

        assert_eq!(summary.per_task().len(), 4);
        assert!(summary.per_task().iter().all(|r| r.outcome.is_success()));
        assert_eq!(summary.failure_count(), 0);

        let max = (5 * UNIT_MS) as f64;
        let sum = (10 * UNIT_MS) as f64;
        assert!(summary.total_duration_ms() >= max);
        assert!(summary.total_duration_ms() < sum);
    }

    #[tokio::test]
    async fn test_results_follow_submission_order() {
        let coordinator = Coordinator::new("batch");
        // "slow" finishes after "fast".
        let items = vec![delayed("slow", 3), delayed("fast", 0)];

        let summary = coordinator.run_batch(items).await.unwrap();

        let names: Vec<_> = summary.per_task().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["slow", "fast"]);
        assert_eq!(summary.per_task()[0].outcome.value(), Some(&3));
        assert!(summary.per_task()[0].duration_ms > summary.per_task()[1].duration_ms);
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_siblings() {
        let coordinator = Coordinator::new("http_requests");
        let items = vec![
            failing("invalid-url", "HTTP request to invalid-url failed with status 404"),
            delayed("1MB.json", 2),
            delayed("5MB.json", 3),
            delayed("512KB.json", 1),
        ];

        let summary = coordinator.run_batch(items).await.unwrap();

        assert_eq!(summary.per_task().len(), 4);
        assert_eq!(summary.failure_count(), 1);
        assert_eq!(summary.success_count(), 3);
        assert_eq!(
            summary.per_task()[0].reason(),
            Some("HTTP request to invalid-url failed with status 404")
        );
        // The slowest sibling still ran to completion.
        assert!(summary.get("5MB.json").unwrap().duration_ms >= (3 * UNIT_MS) as f64);
    }

    #[tokio::test]
    async fn test_total_at_least_every_task() {
        let coordinator = Coordinator::new("batch");
        let items = vec![delayed("a", 1), failing("b", "nope"), delayed("c", 2)];

        let summary = coordinator.run_batch(items).await.unwrap();

        for result in summary.per_task() {
            assert!(summary.total_duration_ms() >= result.duration_ms);
        }
        assert!(summary.total_duration_ms() >= summary.max_task_duration_ms());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let coordinator = Coordinator::new("batch");

        let summary = coordinator.run_batch(Vec::<WorkItem<()>>::new()).await.unwrap();

        assert!(summary.per_task().is_empty());
        assert_eq!(summary.failure_count(), 0);
        assert!(summary.total_duration_ms() >= 0.0);
    }

    #[tokio::test]
    async fn test_duplicate_names_rejected_before_launch() {
        let coordinator = Coordinator::new("batch");
        let calls = Arc::new(AtomicUsize::new(0));

        let items: Vec<WorkItem<()>> = ["a", "b", "a"]
            .into_iter()
            .map(|name| {
                let calls = Arc::clone(&calls);
                WorkItem::new(name, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(())
                })
            })
            .collect();

        let err = coordinator.run_batch(items).await.unwrap_err();

        assert_eq!(err, BatchError::DuplicateWorkItem("a".to_string()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let coordinator = Coordinator::new("batch");
        let err = coordinator.run_batch(vec![delayed("", 0)]).await.unwrap_err();
        assert_eq!(err, BatchError::EmptyWorkItemName);
    }

    #[tokio::test]
    async fn test_panic_becomes_failure() {
        let coordinator = Coordinator::new("batch");
        let items = vec![
            WorkItem::new("explodes", || async {
                if true {
                    panic!("kaboom");
                }
                Ok::<u64, String>(0)
            }),
            delayed("fine", 1),
        ];

        let summary = coordinator.run_batch(items).await.unwrap();

        assert_eq!(summary.failure_count(), 1);
        let reason = summary.get("explodes").and_then(|r| r.reason()).unwrap();
        assert!(reason.contains("operation panicked"));
        assert!(reason.contains("kaboom"));
        assert!(summary.get("fine").unwrap().outcome.is_success());
    }

    #[tokio::test]
    async fn test_single_item() {
        let coordinator = Coordinator::new("batch");
        let summary = coordinator.run_batch(vec![delayed("only", 1)]).await.unwrap();

        assert_eq!(summary.per_task().len(), 1);
        assert!(summary.total_duration_ms() >= summary.per_task()[0].duration_ms);
    }

    #[tokio::test]
    async fn test_sequential_total_tracks_sum() {
        let coordinator = Coordinator::new("sync_http_requests");
        let items = vec![delayed("a", 2), failing("b", "bad status"), delayed("c", 1)];

        let summary = coordinator.run_batch_sequential(items).await.unwrap();

        let names: Vec<_> = summary.per_task().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(summary.failure_count(), 1);
        assert!(summary.total_duration_ms() >= (3 * UNIT_MS) as f64);
    }

    #[tokio::test]
    async fn test_sequential_durations_exclude_waiting() {
        let coordinator = Coordinator::new("sync_http_requests");
        let items = vec![delayed("a", 5), delayed("b", 5), delayed("c", 1)];

        let summary = coordinator.run_batch_sequential(items).await.unwrap();

        // Each task measures only its own delay, not the running total.
        let tolerance = (2 * UNIT_MS) as f64;
        for (result, units) in summary.per_task().iter().zip([5u64, 5, 1]) {
            let own = (units * UNIT_MS) as f64;
            assert!(result.duration_ms >= own, "{} took {}", result.name, result.duration_ms);
            assert!(
                result.duration_ms < own + tolerance,
                "{} took {}",
                result.name,
                result.duration_ms
            );
        }
        assert!(summary.get("c").unwrap().duration_ms < (3 * UNIT_MS) as f64);
        assert!(summary.total_duration_ms() >= (11 * UNIT_MS) as f64);
    }

    #[tokio::test]
    async fn test_concurrent_batches_do_not_collide() {
        let coordinator = Coordinator::new("batch");

        let (first, second) = tokio::join!(
            coordinator.run_batch(vec![delayed("task1", 1)]),
            coordinator.run_batch(vec![delayed("task1", 1)]),
        );

        let first = first.unwrap();
        let second = second.unwrap();
        assert_ne!(first.batch_id(), second.batch_id());
        assert!(first.is_success());
        assert!(second.is_success());
    }
}
