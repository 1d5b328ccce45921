//! Point validation
//!
//! Validators are plain functions run in declaration order before a write.

use crate::metrics::point::MetricPoint;
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Checks one aspect of a point
pub type Validator = Arc<dyn Fn(&MetricPoint) -> Result<(), ValidationError> + Send + Sync>;

/// A failed validation on one attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// Fails when the attribute is missing, null or an empty string
pub fn presence(field: impl Into<String>) -> Validator {
    let field = field.into();
    Arc::new(move |point: &MetricPoint| match point.get(&field) {
        None | Some(JsonValue::Null) => Err(ValidationError::new(&field, "can't be blank")),
        Some(JsonValue::String(s)) if s.trim().is_empty() => {
            Err(ValidationError::new(&field, "can't be blank"))
        }
        Some(_) => Ok(()),
    })
}

/// Run every validator and collect the failures
pub fn run(validators: &[Validator], point: &MetricPoint) -> Vec<ValidationError> {
    validators
        .iter()
        .filter_map(|validate| validate(point).err())
        .collect()
}
