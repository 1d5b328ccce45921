//! Metrics error types
//!
//! Errors raised while building, validating and writing points, and by the
//! terminal calls of a relation.

use crate::client::ClientError;
use crate::metrics::validation::ValidationError;
use crate::query::QueryError;
use thiserror::Error;

/// Errors that can occur in the metrics layer
#[derive(Error, Debug)]
pub enum MetricsError {
    /// The point was already written once
    #[error("Point has already been written")]
    AlreadyPersisted,

    /// Strict write of an invalid point
    #[error("Validation failed: {}", join_errors(.0))]
    ValidationFailed(Vec<ValidationError>),

    /// Attribute is neither a declared tag nor a declared value
    #[error("Unknown attribute '{name}' for series {series}")]
    UnknownAttribute { series: String, name: String },

    /// The series does not resolve to a single name that can be written to
    #[error("Cannot write to series {0}")]
    UnwritableSeries(String),

    /// Query could not be rendered
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Datastore client failure, passed through as is
    #[error(transparent)]
    Client(#[from] ClientError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MetricsError::ValidationFailed(vec![
            ValidationError::new("dummy_id", "can't be blank"),
            ValidationError::new("user_id", "can't be blank"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: dummy_id can't be blank, user_id can't be blank"
        );
    }

    #[test]
    fn test_client_error_is_transparent() {
        let err: MetricsError = ClientError::Api {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "API error 500: boom");
    }
}
