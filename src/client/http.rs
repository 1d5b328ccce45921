//! HTTP datastore client
//!
//! Talks to the datastore's HTTP API:
//!
//! ```text
//! POST {url}/db/{database}/series?time_precision=s   [{"name", "columns", "points"}]
//! GET  {url}/db/{database}/series?q=<query>&time_precision=s
//! ```
//!
//! Query responses arrive as a list of `{name, columns, points}` objects and
//! are turned into points keyed by series name, each point an object of
//! column to value.

use crate::client::error::{ClientError, ClientResult};
use crate::client::{Client, QueryResponse, TimePrecision};
use crate::config::ClientConfig;
use crate::metrics::WritePoint;
use async_trait::async_trait;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::time::Duration;

/// Client for the datastore HTTP API
pub struct HttpClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        if config.database.trim().is_empty() {
            return Err(ClientError::Config("database name is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn series_url(&self) -> String {
        format!(
            "{}/db/{}/series",
            self.config.url.trim_end_matches('/'),
            self.config.database
        )
    }

    async fn check(response: Response) -> ClientResult<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Datastore request failed");
            Err(ClientError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}

#[async_trait]
impl Client for HttpClient {
    async fn write_point(&self, series: &str, point: &WritePoint) -> ClientResult<()> {
        let body = [SeriesPayload::from_point(series, point)];

        let response = self
            .client
            .post(self.series_url())
            .query(&[("time_precision", self.config.time_precision.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        Self::check(response).await?;
        Ok(())
    }

    async fn query(&self, query: &str) -> ClientResult<QueryResponse> {
        let response = self
            .client
            .get(self.series_url())
            .query(&[
                ("q", query),
                ("time_precision", self.config.time_precision.as_str()),
            ])
            .send()
            .await
            .map_err(ClientError::from_transport)?;

        let response = Self::check(response).await?;
        let text = response.text().await.map_err(ClientError::from_transport)?;
        if text.trim().is_empty() {
            return Ok(QueryResponse::empty());
        }

        let payload: Vec<SeriesPayload> = serde_json::from_str(&text)?;
        tracing::debug!(series = payload.len(), "Query response received");
        Ok(into_response(payload))
    }

    fn time_precision(&self) -> TimePrecision {
        self.config.time_precision
    }
}

// ============================================
// Wire format
// ============================================

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct SeriesPayload {
    name: String,
    columns: Vec<String>,
    #[serde(default)]
    points: Vec<Vec<JsonValue>>,
}

impl SeriesPayload {
    /// Values first, then tags, then `time` when set
    fn from_point(series: &str, point: &WritePoint) -> Self {
        let mut columns = Vec::new();
        let mut row = Vec::new();

        for (name, value) in point.values.iter().chain(point.tags.iter()) {
            columns.push(name.clone());
            row.push(value.clone());
        }
        if let Some(ts) = point.timestamp {
            columns.push("time".to_string());
            row.push(JsonValue::from(ts));
        }

        Self {
            name: series.to_string(),
            columns,
            points: vec![row],
        }
    }
}

fn into_response(payload: Vec<SeriesPayload>) -> QueryResponse {
    let mut series: BTreeMap<String, Vec<JsonValue>> = BTreeMap::new();

    for entry in payload {
        let points = series.entry(entry.name).or_default();
        for row in entry.points {
            let object: Map<String, JsonValue> =
                entry.columns.iter().cloned().zip(row).collect();
            points.push(JsonValue::Object(object));
        }
    }

    QueryResponse::Series(series)
}
