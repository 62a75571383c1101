//! Core domain errors.

use thiserror::Error;

/// Misuse of the span protocol.
///
/// These indicate a coordination bug in the caller, never an environmental
/// failure, and are surfaced immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpanError {
    /// A span with this name already exists in the same scope.
    #[error("Span '{name}' already exists in scope '{scope}'")]
    DuplicateSpan { scope: String, name: String },

    /// The span was stopped more than once.
    #[error("Span '{0}' has already been stopped")]
    AlreadyStopped(String),

    /// The span's duration was read while it is still open.
    #[error("Span '{0}' has not been stopped")]
    SpanNotStopped(String),

    /// No span with this name is registered.
    #[error("Unknown span: {0}")]
    UnknownSpan(String),

    /// An unqualified lookup matched spans in several scopes.
    #[error("Span name '{0}' is registered in more than one scope")]
    AmbiguousSpan(String),
}

/// Batch contract violations, raised before any unit is launched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// Two work items share a name.
    #[error("Duplicate work item name: {0}")]
    DuplicateWorkItem(String),

    /// A work item has an empty name.
    #[error("Work item name must not be empty")]
    EmptyWorkItemName,

    /// The span protocol was violated while timing the batch.
    #[error(transparent)]
    Span(#[from] SpanError),
}
