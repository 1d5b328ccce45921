//! Query Builder
//!
//! Composes read queries for the datastore's SQL-like language:
//!
//! - **Duration**: symbolic time units to duration literals
//! - **Condition**: rendered predicate terms
//! - **Predicate**: filter pair to condition translation
//! - **Relation**: the chainable builder and its merge rules
//! - **Serializer**: relation to `select`/`delete` text
//!
//! # Query Language
//!
//! ```text
//! select <fields> from "<series>" [merge "<series>"]
//! [where (<cond>) and (<cond>) ...]
//! [group by time(1h),<field> ...] [fill(0|null|none)]
//! [limit n] [offset n]
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use seriesql::query::{Function, TimeUnit};
//!
//! let sql = measurement.all()
//!     .filter("user_id", 1)
//!     .calc(Function::Percentile, vec!["load".into(), 95.into()])
//!     .past(TimeUnit::Day)
//!     .to_sql()?;
//! // select percentile(load,95) from "visits" where (user_id=1) and (time > now() - 1d)
//! ```

mod calculation;
mod condition;
mod duration;
mod error;
mod predicate;
mod relation;
mod serializer;

pub use calculation::{CalcArg, Calculation, Function};
pub use condition::{Condition, ConditionGroup, Join, Pattern, Value};
pub use duration::{resolve as resolve_duration, Interval, TimeUnit};
pub use error::{QueryError, QueryResult};
pub use predicate::{raw as raw_condition, translate, PredicateValue};
pub use relation::{Fill, GroupSpec, Not, Relation, TimeWindow};
pub use serializer::{render_delete, render_select};
