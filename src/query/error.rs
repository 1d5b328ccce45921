//! Query error types
//!
//! Defines the error conditions raised while composing and rendering queries.

use thiserror::Error;

/// Errors that can occur while building a query
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// A filter was given a value that cannot be translated into a condition
    #[error("Invalid predicate value for '{field}': {reason}")]
    InvalidPredicateValue { field: String, reason: String },

    /// A pattern source failed to compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

impl QueryError {
    pub(crate) fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPredicateValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<regex::Error> for QueryError {
    fn from(err: regex::Error) -> Self {
        QueryError::InvalidPattern(err.to_string())
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
