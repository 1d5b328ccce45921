//! # seriesql
//!
//! Chainable query builder and point writer for InfluxDB-style time-series
//! stores.
//!
//! ## Features
//!
//! - **Fluent queries**: filters, negation, regex matches, time windows,
//!   grouping, fill, limit/offset, merge and aggregate calculations
//! - **Composable relations**: default scopes and relation merging
//! - **Declared measurements**: tags, values, validators and write hooks
//! - **Pluggable clients**: HTTP client for the datastore API and an
//!   in-memory client for tests
//!
//! ## Modules
//!
//! - [`query`]: relation builder and statement serializer
//! - [`metrics`]: measurements, points and the write path
//! - [`series`]: series naming
//! - [`client`]: datastore clients
//! - [`config`]: configuration and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use seriesql::{Config, HttpClient, Measurement, TimeUnit};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let client = HttpClient::new(config.client)?;
//!
//!     let visits = Arc::new(
//!         Measurement::builder("visits")
//!             .tags(["host"])
//!             .values(["user_id", "duration"])
//!             .build(),
//!     );
//!
//!     visits
//!         .all()
//!         .write([("host", json!("web-1")), ("user_id", json!(42))], &client)
//!         .await?;
//!
//!     let points = visits
//!         .all()
//!         .filter("user_id", 42)
//!         .past(TimeUnit::Day)
//!         .load(&client)
//!         .await?;
//!
//!     println!("Found {} visits", points.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod metrics;
pub mod query;
pub mod series;

// Re-export top-level types for convenience
pub use client::{Client, ClientError, ClientResult, HttpClient, MemoryClient, QueryResponse, TimePrecision};

pub use config::{init_logging, ClientConfig, Config, ConfigError, LoggingConfig};

pub use metrics::{
    presence, Measurement, MeasurementBuilder, MetricPoint, MetricsError, MetricsResult,
    ValidationError, WritePoint,
};

pub use query::{
    CalcArg, Fill, Function, Interval, Not, Pattern, PredicateValue, QueryError, QueryResult,
    Relation, TimeUnit,
};

pub use series::{series_name_for, Series};
