//! In-memory datastore client
//!
//! Records every write and query it receives and answers queries with a
//! canned response. Used by tests and for dry runs of query code.

use crate::client::error::{ClientError, ClientResult};
use crate::client::{Client, QueryResponse, TimePrecision};
use crate::metrics::WritePoint;
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Recorded {
    writes: Vec<(String, WritePoint)>,
    queries: Vec<String>,
}

/// Client that keeps everything in memory
#[derive(Debug)]
pub struct MemoryClient {
    precision: TimePrecision,
    response: JsonValue,
    fail_writes: bool,
    recorded: Mutex<Recorded>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self {
            precision: TimePrecision::default(),
            response: json!({ "points": [] }),
            fail_writes: false,
            recorded: Mutex::new(Recorded::default()),
        }
    }

    pub fn with_precision(mut self, precision: TimePrecision) -> Self {
        self.precision = precision;
        self
    }

    /// Answer every query with `response`
    pub fn with_response(mut self, response: JsonValue) -> Self {
        self.response = response;
        self
    }

    /// Make every write fail as if the datastore were down
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Writes received so far, as `(series, point)`
    pub fn writes(&self) -> Vec<(String, WritePoint)> {
        self.recorded().writes.clone()
    }

    /// Query statements received so far
    pub fn queries(&self) -> Vec<String> {
        self.recorded().queries.clone()
    }

    pub fn clear(&self) {
        let mut recorded = self.recorded();
        recorded.writes.clear();
        recorded.queries.clear();
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Client for MemoryClient {
    async fn write_point(&self, series: &str, point: &WritePoint) -> ClientResult<()> {
        if self.fail_writes {
            return Err(ClientError::Unavailable);
        }
        self.recorded()
            .writes
            .push((series.to_string(), point.clone()));
        Ok(())
    }

    async fn query(&self, query: &str) -> ClientResult<QueryResponse> {
        self.recorded().queries.push(query.to_string());
        QueryResponse::from_json(self.response.clone())
    }

    fn time_precision(&self) -> TimePrecision {
        self.precision
    }
}
