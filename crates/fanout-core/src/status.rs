//! Terminal outcome of a unit of work.

use serde::{Deserialize, Serialize};

/// How a unit of work ended.
///
/// Both variants are terminal: no further transitions happen once a
/// unit has produced its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskOutcome<T> {
    /// The operation returned a value.
    Success(T),
    /// The operation failed; the reason is the failure's message.
    Failure { reason: String },
}

impl<T> TaskOutcome<T> {
    /// Build a failure outcome.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Returns true for [`TaskOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true for [`TaskOutcome::Failure`].
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The success value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure { .. } => None,
        }
    }

    /// The failure reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { reason } => Some(reason),
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for TaskOutcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result() {
        let ok: TaskOutcome<u32> = Ok::<_, String>(7).into();
        assert!(ok.is_success());
        assert_eq!(ok.value(), Some(&7));

        let failed: TaskOutcome<u32> = Err::<u32, _>("boom").into();
        assert!(failed.is_failure());
        assert_eq!(failed.reason(), Some("boom"));
    }

    #[test]
    fn test_serialized_shape() {
        let failed: TaskOutcome<()> = TaskOutcome::failure("status 404");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "FAILURE");
        assert_eq!(json["value"]["reason"], "status 404");
    }
}
