//! Measurements and points
//!
//! - **measurement**: class-level description (series, tags, values,
//!   validators, hooks, default scope)
//! - **point**: one instance, its validation and the write path
//! - **validation**: validator functions
//! - **error**: error types
//!
//! # Example
//!
//! ```rust,ignore
//! use seriesql::metrics::Measurement;
//! use serde_json::json;
//!
//! let visits = Arc::new(
//!     Measurement::builder("visits")
//!         .tags(["host"])
//!         .values(["user_id"])
//!         .validates_presence_of(["user_id"])
//!         .build(),
//! );
//!
//! let written = visits.all()
//!     .write([("host", json!("web-1")), ("user_id", json!(42))], &client)
//!     .await?;
//! ```

mod error;
mod measurement;
mod point;
mod validation;

pub use error::{MetricsError, MetricsResult};
pub use measurement::{Measurement, MeasurementBuilder, ScopeFn, WriteHook};
pub use point::{MetricPoint, WritePoint};
pub use validation::{presence, ValidationError, Validator};
