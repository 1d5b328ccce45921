//! Measurement descriptors
//!
//! A [`Measurement`] describes one kind of point: the series it lives in, the
//! declared tag and value names, validators, write hooks and an optional
//! default scope applied to every relation started with [`Measurement::all`].
//!
//! ```rust,ignore
//! let visits = Arc::new(
//!     Measurement::for_type_name("UserVisitsMetrics")
//!         .tags(["host"])
//!         .values(["user_id", "duration"])
//!         .validates_presence_of(["user_id"])
//!         .before_write(|point| point.set_time(Utc::now()))
//!         .default_scope(|rel| rel.past(TimeUnit::Day))
//!         .build(),
//! );
//! ```

use crate::metrics::point::MetricPoint;
use crate::metrics::validation::{self, ValidationError, Validator};
use crate::query::Relation;
use crate::series::{series_name_for, Series};
use std::fmt;
use std::sync::Arc;

/// Runs around a point write
pub type WriteHook = Arc<dyn Fn(&mut MetricPoint) + Send + Sync>;

/// Seeds relations created through [`Measurement::all`]
pub type ScopeFn = Arc<dyn Fn(Relation) -> Relation + Send + Sync>;

/// Class-level description of a kind of point
pub struct Measurement {
    series: Series,
    tag_names: Vec<String>,
    value_names: Vec<String>,
    validators: Vec<Validator>,
    before_write: Vec<WriteHook>,
    after_write: Vec<WriteHook>,
    default_scope: Option<ScopeFn>,
}

impl Measurement {
    pub fn builder(series: impl Into<Series>) -> MeasurementBuilder {
        MeasurementBuilder::new(series.into())
    }

    /// Start a builder whose series is derived from a type name
    /// (`UserVisitsMetrics` -> `user_visits`)
    pub fn for_type_name(type_name: &str) -> MeasurementBuilder {
        MeasurementBuilder::new(Series::Name(series_name_for(type_name)))
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn tag_names(&self) -> &[String] {
        &self.tag_names
    }

    pub fn value_names(&self) -> &[String] {
        &self.value_names
    }

    pub fn is_tag(&self, name: &str) -> bool {
        self.tag_names.iter().any(|t| t == name)
    }

    pub fn is_value(&self, name: &str) -> bool {
        self.value_names.iter().any(|v| v == name)
    }

    /// Whether `name` is a declared tag or value
    pub fn is_attribute(&self, name: &str) -> bool {
        self.is_tag(name) || self.is_value(name)
    }

    pub(crate) fn before_write_hooks(&self) -> &[WriteHook] {
        &self.before_write
    }

    pub(crate) fn after_write_hooks(&self) -> &[WriteHook] {
        &self.after_write
    }

    /// Run all validators against `point`
    pub fn validate(&self, point: &MetricPoint) -> Vec<ValidationError> {
        validation::run(&self.validators, point)
    }

    /// A relation seeded with the default scope, if one is declared
    pub fn all(self: &Arc<Self>) -> Relation {
        let relation = Relation::new(Arc::clone(self));
        match &self.default_scope {
            Some(scope) => scope(relation),
            None => relation,
        }
    }

    /// A relation without the default scope
    pub fn unscoped(self: &Arc<Self>) -> Relation {
        Relation::new(Arc::clone(self))
    }
}

impl fmt::Debug for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Measurement")
            .field("series", &self.series)
            .field("tag_names", &self.tag_names)
            .field("value_names", &self.value_names)
            .field("validators", &self.validators.len())
            .field("before_write", &self.before_write.len())
            .field("after_write", &self.after_write.len())
            .field("default_scope", &self.default_scope.is_some())
            .finish()
    }
}

/// Builder for [`Measurement`]
pub struct MeasurementBuilder {
    inner: Measurement,
}

impl MeasurementBuilder {
    fn new(series: Series) -> Self {
        Self {
            inner: Measurement {
                series,
                tag_names: Vec::new(),
                value_names: Vec::new(),
                validators: Vec::new(),
                before_write: Vec::new(),
                after_write: Vec::new(),
                default_scope: None,
            },
        }
    }

    /// Replace the series
    pub fn series(mut self, series: impl Into<Series>) -> Self {
        self.inner.series = series.into();
        self
    }

    /// Declare tag attributes. Tag and value names stay disjoint; a tag
    /// declaration wins over a value declaration of the same name.
    pub fn tags<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            self.inner.value_names.retain(|v| *v != name);
            push_unique(&mut self.inner.tag_names, name);
        }
        self
    }

    /// Declare value attributes
    pub fn values<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.inner.tag_names.contains(&name) {
                push_unique(&mut self.inner.value_names, name);
            }
        }
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.inner.validators.push(validator);
        self
    }

    /// Require each attribute to be present and non-blank
    pub fn validates_presence_of<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.inner.validators.push(validation::presence(name));
        }
        self
    }

    pub fn before_write<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut MetricPoint) + Send + Sync + 'static,
    {
        self.inner.before_write.push(Arc::new(hook));
        self
    }

    /// Runs only after a successful write
    pub fn after_write<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut MetricPoint) + Send + Sync + 'static,
    {
        self.inner.after_write.push(Arc::new(hook));
        self
    }

    pub fn default_scope<F>(mut self, scope: F) -> Self
    where
        F: Fn(Relation) -> Relation + Send + Sync + 'static,
    {
        self.inner.default_scope = Some(Arc::new(scope));
        self
    }

    pub fn build(self) -> Measurement {
        self.inner
    }
}

fn push_unique(names: &mut Vec<String>, name: String) {
    if !names.contains(&name) {
        names.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::TimeUnit;

    #[test]
    fn test_declarations() {
        let m = Measurement::builder("dummy")
            .tags(["dummy_id", "host"])
            .values(["user_id"])
            .tags(["host", "user_id"])
            .values(["dummy_id"])
            .build();

        assert_eq!(m.tag_names(), ["dummy_id", "host", "user_id"]);
        assert!(m.value_names().is_empty());
        assert!(m.is_tag("host"));
        assert!(!m.is_value("user_id"));
        assert!(!m.is_attribute("other"));
    }

    #[test]
    fn test_for_type_name() {
        let m = Measurement::for_type_name("DummyMetrics").build();
        assert_eq!(m.series(), &Series::from("dummy"));
    }

    #[test]
    fn test_default_scope() {
        let m = Arc::new(
            Measurement::builder("dummy")
                .default_scope(|rel| rel.past(TimeUnit::Hour))
                .build(),
        );

        assert_eq!(
            m.all().to_sql().unwrap(),
            "select * from \"dummy\" where (time > now() - 1h)"
        );
        assert_eq!(m.unscoped().to_sql().unwrap(), "select * from \"dummy\"");
        // Each call starts from a fresh relation
        assert_eq!(
            m.all().limit(1).to_sql().unwrap(),
            "select * from \"dummy\" where (time > now() - 1h) limit 1"
        );
        assert_eq!(
            m.all().to_sql().unwrap(),
            "select * from \"dummy\" where (time > now() - 1h)"
        );
    }
}
