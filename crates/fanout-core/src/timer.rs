//! Named, optionally nested timing spans.
//!
//! A [`Timer`] owns a registry of spans for the lifetime of one batch.
//! Spans are keyed by `(parent scope, name)`, so two units may reuse a
//! name as long as they live under different parents. Every entry is
//! write-once: a span is opened by [`Timer::start`], closed exactly once
//! by [`SpanHandle::stop`], and its duration never changes afterwards.
//!
//! All measurements use [`Instant`], so they are immune to wall-clock
//! adjustments.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::SpanError;

/// Scope label reported for top-level spans.
const ROOT_SCOPE: &str = "<root>";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SpanKey {
    parent: Option<String>,
    name: String,
}

impl SpanKey {
    fn new(parent: Option<&str>, name: &str) -> Self {
        Self {
            parent: parent.map(str::to_owned),
            name: name.to_owned(),
        }
    }

    fn scope(&self) -> &str {
        self.parent.as_deref().unwrap_or(ROOT_SCOPE)
    }

    /// `parent/name`, used in error messages only.
    fn qualified(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}/{}", parent, self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SpanRecord {
    started: Instant,
    ended: Option<Instant>,
}

impl SpanRecord {
    fn elapsed(&self) -> Option<Duration> {
        self.ended.map(|ended| ended.duration_since(self.started))
    }
}

type Registry = Arc<Mutex<HashMap<SpanKey, SpanRecord>>>;

fn lock(spans: &Registry) -> MutexGuard<'_, HashMap<SpanKey, SpanRecord>> {
    // Entries are plain data; a panic elsewhere cannot leave one half-written.
    spans.lock().unwrap_or_else(PoisonError::into_inner)
}

fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Batch-scoped span registry.
///
/// Cloning a `Timer` yields another handle onto the same registry, which
/// is how concurrent units share it. Create a fresh `Timer` per batch.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    spans: Registry,
}

impl Timer {
    /// Create a timer with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new span named `name`, nested under `parent` if given.
    ///
    /// Fails with [`SpanError::DuplicateSpan`] if the name is already
    /// registered in that scope, whether the existing span is open or closed.
    pub fn start(
        &self,
        name: impl Into<String>,
        parent: Option<&str>,
    ) -> Result<SpanHandle, SpanError> {
        let name = name.into();
        let key = SpanKey::new(parent, &name);
        let mut spans = lock(&self.spans);

        if spans.contains_key(&key) {
            return Err(SpanError::DuplicateSpan {
                scope: key.scope().to_owned(),
                name,
            });
        }

        let started = Instant::now();
        spans.insert(
            key.clone(),
            SpanRecord {
                started,
                ended: None,
            },
        );

        Ok(SpanHandle {
            key,
            spans: Arc::clone(&self.spans),
        })
    }

    /// Duration in milliseconds of the stopped span `name`, in any scope.
    ///
    /// Fails with [`SpanError::UnknownSpan`] if no such span exists or it is
    /// still open, and with [`SpanError::AmbiguousSpan`] if the name is used
    /// under more than one parent.
    pub fn get_duration(&self, name: &str) -> Result<f64, SpanError> {
        let spans = lock(&self.spans);
        let mut matches = spans.iter().filter(|(key, _)| key.name == name);

        let (_, record) = matches
            .next()
            .ok_or_else(|| SpanError::UnknownSpan(name.to_owned()))?;
        if matches.next().is_some() {
            return Err(SpanError::AmbiguousSpan(name.to_owned()));
        }

        record
            .elapsed()
            .map(as_millis_f64)
            .ok_or_else(|| SpanError::UnknownSpan(name.to_owned()))
    }

    /// Duration in milliseconds of the stopped span `name` under `parent`.
    pub fn scoped_duration(&self, parent: Option<&str>, name: &str) -> Result<f64, SpanError> {
        let key = SpanKey::new(parent, name);
        lock(&self.spans)
            .get(&key)
            .and_then(SpanRecord::elapsed)
            .map(as_millis_f64)
            .ok_or_else(|| SpanError::UnknownSpan(key.qualified()))
    }

    /// Whether the span `name` under `parent` exists and is still open.
    pub fn is_open(&self, parent: Option<&str>, name: &str) -> bool {
        lock(&self.spans)
            .get(&SpanKey::new(parent, name))
            .is_some_and(|record| record.ended.is_none())
    }

    /// Number of spans registered, open or closed.
    pub fn span_count(&self) -> usize {
        lock(&self.spans).len()
    }
}

/// Handle onto one registered span.
#[derive(Debug)]
pub struct SpanHandle {
    key: SpanKey,
    spans: Registry,
}

impl SpanHandle {
    /// Span name.
    pub fn name(&self) -> &str {
        &self.key.name
    }

    /// Enclosing span name, if nested.
    pub fn parent(&self) -> Option<&str> {
        self.key.parent.as_deref()
    }

    /// Close the span and return its duration in milliseconds.
    pub fn stop(&self) -> Result<f64, SpanError> {
        let ended = Instant::now();
        let mut spans = lock(&self.spans);
        let record = spans
            .get_mut(&self.key)
            .ok_or_else(|| SpanError::UnknownSpan(self.key.qualified()))?;

        if record.ended.is_some() {
            return Err(SpanError::AlreadyStopped(self.key.qualified()));
        }
        record.ended = Some(ended);

        Ok(as_millis_f64(ended.duration_since(record.started)))
    }

    /// Duration in milliseconds; fails while the span is open.
    pub fn duration_ms(&self) -> Result<f64, SpanError> {
        let spans = lock(&self.spans);
        let record = spans
            .get(&self.key)
            .ok_or_else(|| SpanError::UnknownSpan(self.key.qualified()))?;

        record
            .elapsed()
            .map(as_millis_f64)
            .ok_or_else(|| SpanError::SpanNotStopped(self.key.qualified()))
    }

    /// Whether [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        lock(&self.spans)
            .get(&self.key)
            .is_some_and(|record| record.ended.is_some())
    }
}
