//! Series references
//!
//! A series is what a query reads from and a point is written to. It can be
//! a literal name, a server-side pattern, a name computed from the point being
//! written, or a list of those:
//!
//! ```text
//! Name("cpu")               "cpu"
//! Pattern(^cpu\.)           /^cpu\./
//! List(["a", "b"])          merge("a","b")
//! ```

use crate::metrics::MetricPoint;
use crate::query::{Pattern, QueryResult};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Computes a series from the point being written (`None` when querying)
pub type SeriesFn = Arc<dyn Fn(Option<&MetricPoint>) -> Series + Send + Sync>;

/// Reference to one or more series
#[derive(Clone)]
pub enum Series {
    Name(String),
    Pattern(Pattern),
    Computed(SeriesFn),
    List(Vec<Series>),
}

impl Series {
    pub fn name(name: impl Into<String>) -> Self {
        Series::Name(name.into())
    }

    pub fn pattern(source: &str) -> QueryResult<Self> {
        Pattern::new(source).map(Series::Pattern)
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(Option<&MetricPoint>) -> Series + Send + Sync + 'static,
    {
        Series::Computed(Arc::new(f))
    }

    /// Render for query text.
    ///
    /// Names are double-quoted, patterns use the `/.../` literal, computed
    /// series are evaluated against `point` first, and lists of more than one
    /// series become `merge(...)`.
    pub fn quoted(&self, point: Option<&MetricPoint>) -> String {
        match self {
            Series::Name(name) => quote_name(name),
            Series::Pattern(pattern) => pattern.literal(),
            Series::Computed(f) => f(point).quoted(point),
            Series::List(items) => match items.as_slice() {
                [] => quote_name(""),
                [single] => single.quoted(point),
                many => {
                    let parts: Vec<String> = many.iter().map(|s| s.quoted(point)).collect();
                    format!("merge({})", parts.join(","))
                }
            },
        }
    }

    /// The unquoted name a point can be written to, if the reference resolves
    /// to exactly one literal name
    pub fn write_name(&self, point: Option<&MetricPoint>) -> Option<String> {
        match self {
            Series::Name(name) => Some(name.clone()),
            Series::Pattern(_) => None,
            Series::Computed(f) => f(point).write_name(point),
            Series::List(items) => match items.as_slice() {
                [single] => single.write_name(point),
                _ => None,
            },
        }
    }
}

fn quote_name(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\\\""))
}

impl PartialEq for Series {
    fn eq(&self, other: &Self) -> bool {
        self.quoted(None) == other.quoted(None)
    }
}

impl fmt::Debug for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Series::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Series::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.as_str()).finish(),
            Series::Computed(_) => f.write_str("Computed(..)"),
            Series::List(items) => f.debug_tuple("List").field(items).finish(),
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.quoted(None))
    }
}

impl From<&str> for Series {
    fn from(name: &str) -> Self {
        Series::Name(name.to_string())
    }
}

impl From<String> for Series {
    fn from(name: String) -> Self {
        Series::Name(name)
    }
}

impl From<Pattern> for Series {
    fn from(pattern: Pattern) -> Self {
        Series::Pattern(pattern)
    }
}

impl From<Regex> for Series {
    fn from(regex: Regex) -> Self {
        Series::Pattern(Pattern::from(regex))
    }
}

impl<T: Into<Series>> From<Vec<T>> for Series {
    fn from(items: Vec<T>) -> Self {
        Series::List(items.into_iter().map(Into::into).collect())
    }
}

/// Derive a series name from a type name.
///
/// A trailing `Metrics` is dropped, namespace segments are joined with `_`
/// and the result is snake-cased: `Admin::UserVisitsMetrics` -> `admin_user_visits`.
pub fn series_name_for(type_name: &str) -> String {
    let base = type_name
        .strip_suffix("Metrics")
        .filter(|rest| !rest.is_empty())
        .unwrap_or(type_name);

    base.split("::")
        .filter(|segment| !segment.is_empty())
        .map(snake_case)
        .collect::<Vec<_>>()
        .join("_")
}

fn snake_case(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    let mut out = String::with_capacity(word.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.map(|n| n.is_lowercase()).unwrap_or(false),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}
