//! Condition expressions
//!
//! A [`Condition`] is one rendered predicate term of a `where` clause. A single
//! filter call produces a [`ConditionGroup`], rendered in parentheses; the
//! groups of a relation are joined with `and`.

use crate::query::error::QueryResult;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::fmt;

/// A regular expression rendered in the query language's native `/src/` form
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compile a pattern from its source
    pub fn new(source: &str) -> QueryResult<Self> {
        Ok(Self(Regex::new(source)?))
    }

    /// The pattern source as written
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The underlying compiled regex
    pub fn regex(&self) -> &Regex {
        &self.0
    }

    /// Render as a `/.../` literal, escaping bare slashes
    pub fn literal(&self) -> String {
        let mut out = String::with_capacity(self.as_str().len() + 2);
        out.push('/');
        let mut escaped = false;
        for c in self.as_str().chars() {
            if c == '/' && !escaped {
                out.push('\\');
            }
            escaped = c == '\\' && !escaped;
            out.push(c);
        }
        out.push('/');
        out
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Self(regex)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal())
    }
}

/// A scalar operand of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    /// Rendered as epoch seconds with an `s` suffix
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Render the operand as it appears in query text
    pub fn render(&self) -> String {
        match self {
            Self::Integer(n) => n.to_string(),
            Self::Float(x) => format!("{:?}", x),
            Self::String(s) => quote_string(s),
            Self::Boolean(b) => b.to_string(),
            Self::Timestamp(ts) => format!("{}s", ts.timestamp()),
        }
    }

    /// Short type name used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Timestamp(_) => "timestamp",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Single-quote a string literal
pub(crate) fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// One predicate term
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `field=value`
    Eq { field: String, value: Value },
    /// `field<>value`
    Neq { field: String, value: Value },
    /// `field>low and field<high`
    RangeIn { field: String, low: Value, high: Value },
    /// `field<low and field>high`
    RangeOut { field: String, low: Value, high: Value },
    /// `field=~/pattern/`
    Match { field: String, pattern: Pattern },
    /// `field!~/pattern/`
    Negate { field: String, pattern: Pattern },
    /// Emitted verbatim
    Raw(String),
}

impl Condition {
    pub fn render(&self) -> String {
        match self {
            Self::Eq { field, value } => format!("{}={}", field, value),
            Self::Neq { field, value } => format!("{}<>{}", field, value),
            Self::RangeIn { field, low, high } => {
                format!("{f}>{} and {f}<{}", low, high, f = field)
            }
            Self::RangeOut { field, low, high } => {
                format!("{f}<{} and {f}>{}", low, high, f = field)
            }
            Self::Match { field, pattern } => format!("{}=~{}", field, pattern),
            Self::Negate { field, pattern } => format!("{}!~{}", field, pattern),
            Self::Raw(text) => text.clone(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// How the terms of a group are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    And,
    Or,
}

impl Join {
    fn separator(&self) -> &'static str {
        match self {
            Self::And => " and ",
            Self::Or => " or ",
        }
    }
}

/// The terms produced by one filter pair, rendered as `(t1 <join> t2 ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionGroup {
    pub conditions: Vec<Condition>,
    pub join: Join,
}

impl ConditionGroup {
    /// A group holding exactly one term
    pub fn single(condition: Condition) -> Self {
        Self {
            conditions: vec![condition],
            join: Join::And,
        }
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            join: Join::Or,
        }
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            join: Join::And,
        }
    }

    pub fn render(&self) -> String {
        let terms: Vec<String> = self.conditions.iter().map(Condition::render).collect();
        format!("({})", terms.join(self.join.separator()))
    }
}

impl fmt::Display for ConditionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
