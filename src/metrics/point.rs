//! Metric points and the write path
//!
//! A [`MetricPoint`] holds the attribute values of one measurement instance.
//! Writing it partitions the attributes into tags and values, scales the
//! optional timestamp to the client's precision and hands the result to the
//! client:
//!
//! ```text
//! validate -> before_write hooks -> encode -> client.write_point -> after_write hooks
//! ```
//!
//! A point is written at most once.

use crate::client::{Client, TimePrecision};
use crate::metrics::error::{MetricsError, MetricsResult};
use crate::metrics::measurement::Measurement;
use crate::metrics::validation::ValidationError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Payload handed to [`Client::write_point`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WritePoint {
    pub values: BTreeMap<String, JsonValue>,
    pub tags: BTreeMap<String, JsonValue>,
    /// Point time in the client's precision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// One instance of a measurement
#[derive(Debug, Clone)]
pub struct MetricPoint {
    measurement: Arc<Measurement>,
    attributes: BTreeMap<String, JsonValue>,
    time: Option<DateTime<Utc>>,
    persisted: bool,
}

impl MetricPoint {
    /// An empty, unwritten point
    pub fn new(measurement: Arc<Measurement>) -> Self {
        Self {
            measurement,
            attributes: BTreeMap::new(),
            time: None,
            persisted: false,
        }
    }

    /// A point pre-populated from `attrs`; every name must be declared
    pub fn with_attributes<I, K, V>(measurement: Arc<Measurement>, attrs: I) -> MetricsResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<JsonValue>,
    {
        let mut point = Self::new(measurement);
        for (name, value) in attrs {
            point.set(name, value)?;
        }
        Ok(point)
    }

    pub fn measurement(&self) -> &Arc<Measurement> {
        &self.measurement
    }

    /// Set a declared tag or value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> MetricsResult<()> {
        let name = name.into();
        if !self.measurement.is_attribute(&name) {
            return Err(MetricsError::UnknownAttribute {
                series: self.measurement.series().quoted(Some(self)),
                name,
            });
        }
        self.attributes.insert(name, value.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &BTreeMap<String, JsonValue> {
        &self.attributes
    }

    /// Attributes declared as values
    pub fn values(&self) -> BTreeMap<String, JsonValue> {
        self.partition(|name| self.measurement.is_value(name))
    }

    /// Attributes declared as tags
    pub fn tags(&self) -> BTreeMap<String, JsonValue> {
        self.partition(|name| self.measurement.is_tag(name))
    }

    fn partition(&self, keep: impl Fn(&str) -> bool) -> BTreeMap<String, JsonValue> {
        self.attributes
            .iter()
            .filter(|(name, _)| keep(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.time
    }

    pub fn set_time(&mut self, time: DateTime<Utc>) {
        self.time = Some(time);
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// The quoted series this point belongs to
    pub fn series(&self) -> String {
        self.measurement.series().quoted(Some(self))
    }

    /// A fresh, unwritten copy with the same attributes
    pub fn duplicate(&self) -> Self {
        Self {
            measurement: Arc::clone(&self.measurement),
            attributes: self.attributes.clone(),
            time: None,
            persisted: false,
        }
    }

    /// Validation failures, empty when the point is valid
    pub fn errors(&self) -> Vec<ValidationError> {
        self.measurement.validate(self)
    }

    pub fn is_valid(&self) -> bool {
        self.errors().is_empty()
    }

    /// Build the write payload for a client with the given precision
    pub fn encode(&self, precision: TimePrecision) -> MetricsResult<WritePoint> {
        if self.persisted {
            return Err(MetricsError::AlreadyPersisted);
        }
        Ok(WritePoint {
            values: self.values(),
            tags: self.tags(),
            timestamp: self.time.map(|t| precision.scale(t)),
        })
    }

    /// Write the point.
    ///
    /// Returns `Ok(false)` without writing when validation fails, and
    /// [`MetricsError::AlreadyPersisted`] when the point was written before.
    pub async fn write<C: Client + ?Sized>(&mut self, client: &C) -> MetricsResult<bool> {
        if self.persisted {
            return Err(MetricsError::AlreadyPersisted);
        }

        let errors = self.errors();
        if !errors.is_empty() {
            tracing::warn!(
                series = %self.series(),
                errors = errors.len(),
                "Point failed validation, not written"
            );
            return Ok(false);
        }

        let measurement = Arc::clone(&self.measurement);
        for hook in measurement.before_write_hooks() {
            hook(&mut *self);
        }

        let series = self.write_series()?;
        let payload = self.encode(client.time_precision())?;
        tracing::debug!(series = %series, "Writing point");
        client.write_point(&series, &payload).await?;
        self.persisted = true;

        for hook in measurement.after_write_hooks() {
            hook(&mut *self);
        }
        Ok(true)
    }

    /// Write the point, failing with [`MetricsError::ValidationFailed`] when
    /// it is invalid
    pub async fn write_strict<C: Client + ?Sized>(&mut self, client: &C) -> MetricsResult<()> {
        let errors = self.errors();
        if !errors.is_empty() {
            return Err(MetricsError::ValidationFailed(errors));
        }
        if self.write(client).await? {
            Ok(())
        } else {
            Err(MetricsError::ValidationFailed(self.errors()))
        }
    }

    fn write_series(&self) -> MetricsResult<String> {
        self.measurement
            .series()
            .write_name(Some(self))
            .ok_or_else(|| MetricsError::UnwritableSeries(self.series()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryClient;
    use crate::series::Series;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dummy() -> Arc<Measurement> {
        Arc::new(
            Measurement::builder("dummy")
                .tags(["dummy_id", "host"])
                .values(["user_id"])
                .validates_presence_of(["dummy_id", "user_id"])
                .build(),
        )
    }

    fn valid_point() -> MetricPoint {
        MetricPoint::with_attributes(
            dummy(),
            [("dummy_id", json!(1)), ("host", json!("a")), ("user_id", json!(2))],
        )
        .unwrap()
    }

    #[test]
    fn test_unknown_attribute() {
        let err = MetricPoint::with_attributes(dummy(), [("nope", json!(1))]).unwrap_err();
        assert!(matches!(err, MetricsError::UnknownAttribute { ref name, .. } if name == "nope"));
    }

    #[test]
    fn test_partition() {
        let point = valid_point();
        assert_eq!(point.values().keys().collect::<Vec<_>>(), ["user_id"]);
        assert_eq!(point.tags().keys().collect::<Vec<_>>(), ["dummy_id", "host"]);
    }

    #[test]
    fn test_encode_timestamp_precision() {
        let time = Utc.with_ymd_and_hms(2014, 12, 31, 0, 0, 0).unwrap();
        let point = valid_point().with_time(time);

        let seconds = point.encode(TimePrecision::Seconds).unwrap();
        assert_eq!(seconds.timestamp, Some(1_419_984_000));

        let millis = point.encode(TimePrecision::Milliseconds).unwrap();
        assert_eq!(millis.timestamp, Some(1_419_984_000_000));

        let without = valid_point().encode(TimePrecision::Seconds).unwrap();
        assert_eq!(without.timestamp, None);
        assert_eq!(
            serde_json::to_value(&without).unwrap(),
            json!({ "values": { "user_id": 2 }, "tags": { "dummy_id": 1, "host": "a" } })
        );
    }

    #[tokio::test]
    async fn test_write_once() {
        let client = MemoryClient::new();
        let mut point = valid_point();

        assert!(point.write(&client).await.unwrap());
        assert!(point.is_persisted());
        assert!(matches!(
            point.write(&client).await,
            Err(MetricsError::AlreadyPersisted)
        ));

        let writes = client.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "dummy");
    }

    #[tokio::test]
    async fn test_invalid_write() {
        let client = MemoryClient::new();
        let mut point = MetricPoint::with_attributes(dummy(), [("dummy_id", json!(1))]).unwrap();

        assert!(!point.write(&client).await.unwrap());
        assert!(!point.is_persisted());

        match point.write_strict(&client).await {
            Err(MetricsError::ValidationFailed(errors)) => {
                assert_eq!(errors, vec![ValidationError::new("user_id", "can't be blank")]);
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
        assert!(client.writes().is_empty());
    }

    #[tokio::test]
    async fn test_hooks() {
        static AFTER: AtomicUsize = AtomicUsize::new(0);
        let stamp = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        let measurement = Arc::new(
            Measurement::builder("dummy")
                .values(["user_id"])
                .before_write(move |point| point.set_time(stamp))
                .after_write(|_| {
                    AFTER.fetch_add(1, Ordering::SeqCst);
                })
                .build(),
        );
        let client = MemoryClient::new();
        let mut point = MetricPoint::with_attributes(measurement, [("user_id", json!(1))]).unwrap();

        point.write(&client).await.unwrap();
        assert_eq!(point.time(), Some(stamp));
        assert_eq!(AFTER.load(Ordering::SeqCst), 1);
        assert_eq!(client.writes()[0].1.timestamp, Some(stamp.timestamp()));
    }

    #[tokio::test]
    async fn test_failed_write_skips_after_hooks() {
        static AFTER: AtomicUsize = AtomicUsize::new(0);

        let measurement = Arc::new(
            Measurement::builder("dummy")
                .values(["user_id"])
                .after_write(|_| {
                    AFTER.fetch_add(1, Ordering::SeqCst);
                })
                .build(),
        );
        let client = MemoryClient::new().failing_writes();
        let mut point = MetricPoint::with_attributes(measurement, [("user_id", json!(1))]).unwrap();

        assert!(matches!(point.write(&client).await, Err(MetricsError::Client(_))));
        assert!(!point.is_persisted());
        assert_eq!(AFTER.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_computed_series() {
        let measurement = Arc::new(
            Measurement::builder(Series::computed(|point| match point.and_then(|p| p.get("host")) {
                Some(JsonValue::String(host)) => Series::name(format!("cpu.{}", host)),
                _ => Series::name("cpu"),
            }))
            .tags(["host"])
            .values(["load"])
            .build(),
        );
        let client = MemoryClient::new();
        let mut point =
            MetricPoint::with_attributes(measurement, [("host", json!("web")), ("load", json!(0.5))])
                .unwrap();

        assert_eq!(point.series(), "\"cpu.web\"");
        point.write(&client).await.unwrap();
        assert_eq!(client.writes()[0].0, "cpu.web");
    }

    #[tokio::test]
    async fn test_pattern_series_is_unwritable() {
        let measurement = Arc::new(
            Measurement::builder(Series::pattern("^cpu").unwrap())
                .values(["load"])
                .build(),
        );
        let client = MemoryClient::new();
        let mut point = MetricPoint::with_attributes(measurement, [("load", json!(1))]).unwrap();

        assert!(matches!(
            point.write(&client).await,
            Err(MetricsError::UnwritableSeries(_))
        ));
    }
}
