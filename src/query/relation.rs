//! Relation: the chainable query builder
//!
//! A [`Relation`] accumulates the clauses of one query against a
//! measurement's series and renders them on demand. Each builder call consumes
//! the relation and returns it, so queries read as a chain:
//!
//! ```rust,ignore
//! let sql = visits.all()
//!     .select(["user_id"])
//!     .filter("host", "web-1")
//!     .not().filter("user_id", [0, 1])
//!     .time_with_fill(TimeUnit::Hour, 0)
//!     .limit(10)
//!     .to_sql()?;
//! ```
//!
//! Invalid filter values do not break the chain; the first one is kept and
//! reported by `to_sql` or by any terminal call.
//!
//! A relation is an owned value. Share one between tasks by cloning it.

use crate::client::{Client, QueryResponse};
use crate::metrics::{Measurement, MetricPoint, MetricsResult};
use crate::query::calculation::{CalcArg, Calculation, Function};
use crate::query::condition::{Condition, ConditionGroup};
use crate::query::duration::Interval;
use crate::query::error::{QueryError, QueryResult};
use crate::query::predicate::{self, PredicateValue};
use crate::query::serializer;
use crate::series::Series;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Number of points shown by [`Relation::inspect`] before truncating
const INSPECT_LIMIT: usize = 10;

/// How empty `group by time(..)` buckets are filled
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    None,
    Null,
    Integer(i64),
    Float(f64),
}

impl From<i64> for Fill {
    fn from(n: i64) -> Self {
        Fill::Integer(n)
    }
}

impl From<i32> for Fill {
    fn from(n: i32) -> Self {
        Fill::Integer(n as i64)
    }
}

impl From<f64> for Fill {
    fn from(x: f64) -> Self {
        Fill::Float(x)
    }
}

impl fmt::Display for Fill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fill::None => f.write_str("none"),
            Fill::Null => f.write_str("null"),
            Fill::Integer(n) => write!(f, "{}", n),
            Fill::Float(x) => write!(f, "{}", x),
        }
    }
}

/// GROUP BY specification
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupSpec {
    /// Field names or raw fragments, in call order
    pub terms: Vec<String>,
    /// `time(..)` bucket, always rendered first
    pub bucket: Option<Interval>,
    pub fill: Option<Fill>,
}

/// Restricts the queried time span
#[derive(Debug, Clone, PartialEq)]
pub enum TimeWindow {
    /// `time > now() - <interval>`
    Past(Interval),
    /// `time > <epoch>s`
    Since(DateTime<Utc>),
}

impl TimeWindow {
    pub fn condition(&self) -> ConditionGroup {
        let text = match self {
            TimeWindow::Past(interval) => format!("time > now() - {}", interval.resolve()),
            TimeWindow::Since(instant) => format!("time > {}s", instant.timestamp()),
        };
        ConditionGroup::single(Condition::Raw(text))
    }
}

/// Chainable query builder over a measurement's series
#[derive(Debug, Clone)]
pub struct Relation {
    pub(crate) measurement: Arc<Measurement>,
    pub(crate) series: Series,
    pub(crate) select: Vec<String>,
    pub(crate) conditions: Vec<ConditionGroup>,
    pub(crate) group: GroupSpec,
    pub(crate) window: Option<TimeWindow>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) merge_targets: Vec<Series>,
    pub(crate) calculation: Option<Calculation>,
    error: Option<QueryError>,
}

impl Relation {
    /// A fresh relation over the measurement's series, ignoring any default scope
    pub fn new(measurement: Arc<Measurement>) -> Self {
        let series = measurement.series().clone();
        Self {
            measurement,
            series,
            select: Vec::new(),
            conditions: Vec::new(),
            group: GroupSpec::default(),
            window: None,
            limit: None,
            offset: None,
            merge_targets: Vec::new(),
            calculation: None,
            error: None,
        }
    }

    pub fn measurement(&self) -> &Arc<Measurement> {
        &self.measurement
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    /// Condition groups added through the filter calls, without the time window
    pub fn conditions(&self) -> &[ConditionGroup] {
        &self.conditions
    }

    pub fn group_spec(&self) -> &GroupSpec {
        &self.group
    }

    pub fn time_window(&self) -> Option<&TimeWindow> {
        self.window.as_ref()
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    pub fn merge_targets(&self) -> &[Series] {
        &self.merge_targets
    }

    pub fn calculation(&self) -> Option<&Calculation> {
        self.calculation.as_ref()
    }

    /// First error recorded by a filter call, if any
    pub fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    // ------------------------------------------------------------------
    // Builder
    // ------------------------------------------------------------------

    /// Append fields (or raw fragments such as `count(user_id)`) to the select list
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Add a `field <op> value` condition
    pub fn filter(self, field: &str, value: impl Into<PredicateValue>) -> Self {
        let group = predicate::translate(field, value.into(), false);
        self.push_condition(group)
    }

    /// Add one condition group per pair, in order
    pub fn filters<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<PredicateValue>,
    {
        pairs
            .into_iter()
            .fold(self, |rel, (field, value)| rel.filter(field.as_ref(), value))
    }

    /// Add a raw condition, emitted verbatim inside parentheses
    pub fn filter_raw(self, text: &str) -> Self {
        let group = predicate::raw(text);
        self.push_condition(group)
    }

    /// Negate the next filter call
    pub fn not(self) -> Not {
        Not { relation: self }
    }

    /// Append GROUP BY terms (field names or raw fragments)
    pub fn group<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group.terms.extend(terms.into_iter().map(Into::into));
        self
    }

    /// Group into `time(..)` buckets
    pub fn time(mut self, interval: impl Into<Interval>) -> Self {
        self.group.bucket = Some(interval.into());
        self
    }

    /// Group into `time(..)` buckets and fill empty ones
    pub fn time_with_fill(self, interval: impl Into<Interval>, fill: impl Into<Fill>) -> Self {
        self.time(interval).fill(fill)
    }

    /// Fill empty buckets. A non-finite float is recorded as an error.
    pub fn fill(mut self, fill: impl Into<Fill>) -> Self {
        let fill = fill.into();
        if let Fill::Float(x) = fill {
            if !x.is_finite() {
                let err = QueryError::invalid_value("fill", format!("non-finite float {}", x));
                return self.push_condition(Err(err));
            }
        }
        self.group.fill = Some(fill);
        self
    }

    /// Only points newer than `now() - interval`. Replaces any `since` window.
    pub fn past(mut self, interval: impl Into<Interval>) -> Self {
        self.window = Some(TimeWindow::Past(interval.into()));
        self
    }

    /// Only points after `instant`. Replaces any `past` window.
    pub fn since(mut self, instant: DateTime<Utc>) -> Self {
        self.window = Some(TimeWindow::Since(instant));
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Also read from `series` (`from "a" merge "b"`). A list adds one
    /// target per element.
    pub fn merge(mut self, series: impl Into<Series>) -> Self {
        self.add_merge_target(series.into());
        self
    }

    /// Replace the select list with `function(args)`. A later call replaces
    /// an earlier one.
    pub fn calc(mut self, function: impl Into<Function>, args: Vec<CalcArg>) -> Self {
        self.calculation = Some(Calculation::new(function, args));
        self
    }

    fn push_condition(mut self, group: QueryResult<ConditionGroup>) -> Self {
        match group {
            Ok(group) => self.conditions.push(group),
            Err(err) => {
                if self.error.is_none() {
                    self.error = Some(err);
                }
            }
        }
        self
    }

    // ------------------------------------------------------------------
    // Merging
    // ------------------------------------------------------------------

    /// Fold `other` into this relation.
    ///
    /// Conditions and group terms are concatenated (receiver first). Select
    /// fields are replaced only when `other` has some. Bucket, fill, window,
    /// limit, offset and calculation take `other`'s value when it is set.
    /// `other`'s series, when different, becomes a merge target, followed by
    /// `other`'s own merge targets.
    pub fn merge_from(&mut self, other: &Relation) -> &mut Self {
        self.conditions.extend(other.conditions.iter().cloned());
        self.group.terms.extend(other.group.terms.iter().cloned());

        if other.group.bucket.is_some() {
            self.group.bucket = other.group.bucket.clone();
        }
        if other.group.fill.is_some() {
            self.group.fill = other.group.fill.clone();
        }
        if !other.select.is_empty() {
            self.select = other.select.clone();
        }
        if other.window.is_some() {
            self.window = other.window.clone();
        }
        if other.limit.is_some() {
            self.limit = other.limit;
        }
        if other.offset.is_some() {
            self.offset = other.offset;
        }
        if other.calculation.is_some() {
            self.calculation = other.calculation.clone();
        }

        if other.series != self.series {
            self.add_merge_target(other.series.clone());
        }
        for target in &other.merge_targets {
            self.add_merge_target(target.clone());
        }

        if self.error.is_none() {
            self.error = other.error.clone();
        }
        self
    }

    /// Non-destructive [`merge_from`](Self::merge_from): returns the merged copy
    pub fn merged(&self, other: &Relation) -> Relation {
        let mut merged = self.clone();
        merged.merge_from(other);
        merged
    }

    fn add_merge_target(&mut self, target: Series) {
        if let Series::List(items) = target {
            for item in items {
                self.add_merge_target(item);
            }
        } else if target != self.series && !self.merge_targets.contains(&target) {
            self.merge_targets.push(target);
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// The `select` statement for the current state
    pub fn to_sql(&self) -> QueryResult<String> {
        self.check()?;
        Ok(serializer::render_select(self))
    }

    /// The `delete` statement for the current state
    pub fn to_delete_sql(&self) -> QueryResult<String> {
        self.check()?;
        Ok(serializer::render_delete(self))
    }

    fn check(&self) -> QueryResult<()> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Points
    // ------------------------------------------------------------------

    /// Build a point for this relation's measurement without writing it
    pub fn build<I, K, V>(&self, attrs: I) -> MetricsResult<MetricPoint>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<JsonValue>,
    {
        MetricPoint::with_attributes(self.measurement.clone(), attrs)
    }

    /// Alias of [`build`](Self::build)
    pub fn new_point<I, K, V>(&self, attrs: I) -> MetricsResult<MetricPoint>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<JsonValue>,
    {
        self.build(attrs)
    }

    /// Build and write a point. Returns `None` when validation fails.
    pub async fn write<C, I, K, V>(&self, attrs: I, client: &C) -> MetricsResult<Option<MetricPoint>>
    where
        C: Client + ?Sized,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<JsonValue>,
    {
        let mut point = self.build(attrs)?;
        if point.write(client).await? {
            Ok(Some(point))
        } else {
            Ok(None)
        }
    }

    /// Build and write a point, failing when validation fails
    pub async fn write_strict<C, I, K, V>(&self, attrs: I, client: &C) -> MetricsResult<MetricPoint>
    where
        C: Client + ?Sized,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<JsonValue>,
    {
        let mut point = self.build(attrs)?;
        point.write_strict(client).await?;
        Ok(point)
    }

    // ------------------------------------------------------------------
    // Terminal queries
    // ------------------------------------------------------------------

    /// Run the query and return every point of the response
    pub async fn load<C: Client + ?Sized>(&self, client: &C) -> MetricsResult<Vec<JsonValue>> {
        let response = self.fetch(client).await?;
        Ok(response.into_points())
    }

    /// Whether the query returns no points
    pub async fn is_empty<C: Client + ?Sized>(&self, client: &C) -> MetricsResult<bool> {
        Ok(self.fetch(client).await?.is_empty())
    }

    pub async fn is_present<C: Client + ?Sized>(&self, client: &C) -> MetricsResult<bool> {
        Ok(!self.is_empty(client).await?)
    }

    /// Delete the points matched by this relation. Returns the statement sent.
    pub async fn delete_all<C: Client + ?Sized>(&self, client: &C) -> MetricsResult<String> {
        let sql = self.to_delete_sql()?;
        tracing::debug!(query = %sql, "Deleting points");
        client.query(&sql).await?;
        Ok(sql)
    }

    /// Short description listing the first points of the result
    pub async fn inspect<C: Client + ?Sized>(&self, client: &C) -> MetricsResult<String> {
        let points = self.load(client).await?;
        let mut shown: Vec<String> = points
            .iter()
            .take(INSPECT_LIMIT)
            .map(ToString::to_string)
            .collect();
        if points.len() > INSPECT_LIMIT {
            shown.push("...".to_string());
        }
        Ok(format!("#<Relation [{}]>", shown.join(", ")))
    }

    async fn fetch<C: Client + ?Sized>(&self, client: &C) -> MetricsResult<QueryResponse> {
        let sql = self.to_sql()?;
        tracing::debug!(query = %sql, "Running query");
        Ok(client.query(&sql).await?)
    }
}

/// Negation scope returned by [`Relation::not`]
#[derive(Debug, Clone)]
pub struct Not {
    relation: Relation,
}

impl Not {
    /// Add the negated `field <op> value` condition
    pub fn filter(self, field: &str, value: impl Into<PredicateValue>) -> Relation {
        let group = predicate::translate(field, value.into(), true);
        self.relation.push_condition(group)
    }

    /// Add one negated condition group per pair
    pub fn filters<I, K, V>(self, pairs: I) -> Relation
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<PredicateValue>,
    {
        pairs.into_iter().fold(self.relation, |rel, (field, value)| {
            let group = predicate::translate(field.as_ref(), value.into(), true);
            rel.push_condition(group)
        })
    }
}
