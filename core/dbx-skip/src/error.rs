//! Error types for the DBX executor.
//!
//! All public APIs return `DbxResult<T>` — no panics in library code.

use thiserror::Error;

/// Unified error type for all executor operations.
#[derive(Debug, Error)]
pub enum DbxError {
    /// A row-count clause evaluated to a negative value
    #[error("{clause} must not be negative (got {value})")]
    InvalidBound { clause: &'static str, value: i64 },

    /// A child operator broke the executor's reversibility contract
    #[error("internal consistency error: {0}")]
    InternalConsistency(String),

    /// Operator state machine reached a state it cannot be in
    #[error("impossible operator state: {0}")]
    ImpossibleState(String),

    /// Schema definition or validation error
    #[error("schema error: {0}")]
    Schema(String),

    /// Apache Arrow error (RecordBatch operations)
    #[error("arrow error: {source}")]
    Arrow {
        #[from]
        source: arrow::error::ArrowError,
    },

    /// Standard I/O error
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Type mismatch between expected and actual values
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Runtime parameter was read before any value was bound to it
    #[error("no value found for parameter ${0}")]
    ParamNotFound(usize),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// SQL execution error
    #[error("SQL execution error: {message}\nContext: {context}")]
    SqlExecution { message: String, context: String },

    /// Invalid operation
    #[error("invalid operation: {message}\nContext: {context}")]
    InvalidOperation { message: String, context: String },
}

/// Result type alias for all executor operations.
pub type DbxResult<T> = Result<T, DbxError>;

// From 구현들
impl From<serde_json::Error> for DbxError {
    fn from(err: serde_json::Error) -> Self {
        DbxError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_bound() {
        let err = DbxError::InvalidBound {
            clause: "SKIP",
            value: -1,
        };
        assert_eq!(err.to_string(), "SKIP must not be negative (got -1)");
    }

    #[test]
    fn error_display_internal_consistency() {
        let err = DbxError::InternalConsistency("SKIP subplan failed to run backwards".into());
        assert!(err.to_string().contains("failed to run backwards"));
    }

    #[test]
    fn error_display_type_mismatch() {
        let err = DbxError::TypeMismatch {
            expected: "Int64".to_string(),
            actual: "Utf8".to_string(),
        };
        assert_eq!(err.to_string(), "type mismatch: expected Int64, got Utf8");
    }

    #[test]
    fn error_display_param_not_found() {
        let err = DbxError::ParamNotFound(3);
        assert_eq!(err.to_string(), "no value found for parameter $3");
    }

    #[test]
    fn error_from_serde_json() {
        let parse: Result<u32, _> = serde_json::from_str("not json");
        let err: DbxError = parse.unwrap_err().into();
        assert!(matches!(err, DbxError::Serialization(_)));
    }

    #[test]
    fn dbx_result_err() {
        let result: DbxResult<i32> = Err(DbxError::ParamNotFound(0));
        assert!(result.is_err());
    }
}
