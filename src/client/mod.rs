//! Datastore clients
//!
//! The query builder and the write path talk to the datastore only through
//! the [`Client`] trait:
//!
//! - [`HttpClient`]: HTTP API client built on `reqwest`
//! - [`MemoryClient`]: records writes and queries, answers with a canned
//!   response
//!
//! Clients do not retry; errors reach the caller unchanged.

mod error;
mod http;
mod memory;

pub use error::{ClientError, ClientResult};
pub use http::HttpClient;
pub use memory::MemoryClient;

use crate::metrics::WritePoint;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Operations the core needs from a datastore connection
#[async_trait]
pub trait Client: Send + Sync {
    /// Write one point to `series` (unquoted name)
    async fn write_point(&self, series: &str, point: &WritePoint) -> ClientResult<()>;

    /// Run a query statement
    async fn query(&self, query: &str) -> ClientResult<QueryResponse>;

    /// Precision used for point timestamps
    fn time_precision(&self) -> TimePrecision;
}

/// Timestamp precision of the datastore connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimePrecision {
    #[default]
    #[serde(rename = "s")]
    Seconds,
    #[serde(rename = "ms")]
    Milliseconds,
    #[serde(rename = "u")]
    Microseconds,
}

impl TimePrecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seconds => "s",
            Self::Milliseconds => "ms",
            Self::Microseconds => "u",
        }
    }

    /// Express `time` in this precision
    pub fn scale(&self, time: DateTime<Utc>) -> i64 {
        match self {
            Self::Seconds => time.timestamp(),
            Self::Milliseconds => time.timestamp_millis(),
            Self::Microseconds => time.timestamp_micros(),
        }
    }
}

/// Parse a precision suffix. Unknown values mean seconds.
impl FromStr for TimePrecision {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ms" => Self::Milliseconds,
            "u" | "us" => Self::Microseconds,
            _ => Self::Seconds,
        })
    }
}

impl fmt::Display for TimePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a query: either a flat point list or points keyed by series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Points { points: Vec<JsonValue> },
    Series(BTreeMap<String, Vec<JsonValue>>),
}

impl QueryResponse {
    pub fn empty() -> Self {
        QueryResponse::Points { points: Vec::new() }
    }

    /// Interpret a JSON document as a query response
    pub fn from_json(value: JsonValue) -> ClientResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// All points, series by series
    pub fn points(&self) -> Vec<&JsonValue> {
        match self {
            QueryResponse::Points { points } => points.iter().collect(),
            QueryResponse::Series(series) => series.values().flatten().collect(),
        }
    }

    pub fn into_points(self) -> Vec<JsonValue> {
        match self {
            QueryResponse::Points { points } => points,
            QueryResponse::Series(series) => series.into_values().flatten().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            QueryResponse::Points { points } => points.is_empty(),
            QueryResponse::Series(series) => series.values().all(Vec::is_empty),
        }
    }
}
