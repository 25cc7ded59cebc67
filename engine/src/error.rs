//! Error types for the tasksync engine.

use thiserror::Error;

/// All possible errors from the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Validation errors
    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("unknown priority: {0}")]
    UnknownPriority(String),

    // Decoding errors
    #[error("malformed record at '{key}': {reason}")]
    MalformedRecord { key: String, reason: String },
}

impl Error {
    pub(crate) fn malformed(key: impl Into<String>, reason: impl ToString) -> Self {
        Error::MalformedRecord {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::InvalidTask("text must not be empty".into());
        assert_eq!(err.to_string(), "invalid task: text must not be empty");

        let err = Error::UnknownPriority("URGENT".into());
        assert_eq!(err.to_string(), "unknown priority: URGENT");

        let err = Error::MalformedRecord {
            key: "tasks/Work/1".into(),
            reason: "missing field `text`".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed record at 'tasks/Work/1': missing field `text`"
        );
    }
}
