//! Predicate translation
//!
//! Turns a `field => value` pair into a [`ConditionGroup`]. The value's shape
//! decides the rendering:
//!
//! ```text
//! scalar   user_id=1                      user_id<>1
//! list     (id=1 or id=2)                 (id<>1 and id<>2)
//! range    (v>1 and v<4)                  (v<1 and v>4)
//! pattern  (host=~/^web/)                 (host!~/^web/)
//! ```
//!
//! Range bounds are strict on both sides.

use crate::query::condition::{Condition, ConditionGroup, Pattern, Value};
use crate::query::error::{QueryError, QueryResult};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::ops::{Range, RangeInclusive};

/// The right-hand side of a filter pair
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateValue {
    Scalar(Value),
    List(Vec<Value>),
    Range(Value, Value),
    Pattern(Pattern),
}

macro_rules! scalar_conversions {
    ($($ty:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(<$target>::from(v))
                }
            }

            impl From<$ty> for PredicateValue {
                fn from(v: $ty) -> Self {
                    PredicateValue::Scalar(Value::from(v))
                }
            }
        )*
    };
}

scalar_conversions! {
    i64 => Integer as i64,
    i32 => Integer as i64,
    u32 => Integer as i64,
    f64 => Float as f64,
    f32 => Float as f64,
    bool => Boolean as bool,
    String => String as String,
    &str => String as String,
    DateTime<Utc> => Timestamp as DateTime<Utc>,
}

impl From<Value> for PredicateValue {
    fn from(v: Value) -> Self {
        PredicateValue::Scalar(v)
    }
}

impl From<Pattern> for PredicateValue {
    fn from(p: Pattern) -> Self {
        PredicateValue::Pattern(p)
    }
}

impl From<Regex> for PredicateValue {
    fn from(r: Regex) -> Self {
        PredicateValue::Pattern(Pattern::from(r))
    }
}

impl<T: Into<Value>> From<Vec<T>> for PredicateValue {
    fn from(items: Vec<T>) -> Self {
        PredicateValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for PredicateValue {
    fn from(items: [T; N]) -> Self {
        PredicateValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<RangeInclusive<T>> for PredicateValue {
    fn from(range: RangeInclusive<T>) -> Self {
        let (low, high) = range.into_inner();
        PredicateValue::Range(low.into(), high.into())
    }
}

impl<T: Into<Value>> From<Range<T>> for PredicateValue {
    fn from(range: Range<T>) -> Self {
        PredicateValue::Range(range.start.into(), range.end.into())
    }
}

/// Translate one filter pair into its condition group
pub fn translate(field: &str, value: PredicateValue, negated: bool) -> QueryResult<ConditionGroup> {
    if field.trim().is_empty() {
        return Err(QueryError::invalid_value(field, "field name is empty"));
    }
    let field = field.to_string();

    match value {
        PredicateValue::Scalar(value) => {
            check_scalar(&field, &value)?;
            Ok(ConditionGroup::single(equality(field, value, negated)))
        }
        PredicateValue::Pattern(pattern) => Ok(ConditionGroup::single(if negated {
            Condition::Negate { field, pattern }
        } else {
            Condition::Match { field, pattern }
        })),
        PredicateValue::Range(low, high) => {
            check_range(&field, &low, &high)?;
            Ok(ConditionGroup::single(if negated {
                Condition::RangeOut { field, low, high }
            } else {
                Condition::RangeIn { field, low, high }
            }))
        }
        PredicateValue::List(values) => {
            if values.is_empty() {
                return Err(QueryError::invalid_value(field, "empty list"));
            }
            for value in &values {
                check_scalar(&field, value)?;
            }
            let conditions = values
                .into_iter()
                .map(|value| equality(field.clone(), value, negated))
                .collect();
            // Exclusion of a list is conjunctive
            Ok(if negated {
                ConditionGroup::all(conditions)
            } else {
                ConditionGroup::any(conditions)
            })
        }
    }
}

/// Wrap raw query text as its own group
pub fn raw(text: &str) -> QueryResult<ConditionGroup> {
    if text.trim().is_empty() {
        return Err(QueryError::invalid_value("<raw>", "condition text is empty"));
    }
    Ok(ConditionGroup::single(Condition::Raw(text.to_string())))
}

fn equality(field: String, value: Value, negated: bool) -> Condition {
    if negated {
        Condition::Neq { field, value }
    } else {
        Condition::Eq { field, value }
    }
}

fn check_scalar(field: &str, value: &Value) -> QueryResult<()> {
    match value {
        Value::Float(x) if !x.is_finite() => {
            Err(QueryError::invalid_value(field, format!("non-finite float {}", x)))
        }
        _ => Ok(()),
    }
}

fn check_range(field: &str, low: &Value, high: &Value) -> QueryResult<()> {
    check_scalar(field, low)?;
    check_scalar(field, high)?;

    let numeric = |v: &Value| matches!(v, Value::Integer(_) | Value::Float(_));
    match (low, high) {
        (Value::Boolean(_), _) | (_, Value::Boolean(_)) => Err(QueryError::invalid_value(
            field,
            "boolean range bounds",
        )),
        (a, b) if numeric(a) && numeric(b) => Ok(()),
        (Value::String(_), Value::String(_)) => Ok(()),
        (Value::Timestamp(_), Value::Timestamp(_)) => Ok(()),
        (a, b) => Err(QueryError::invalid_value(
            field,
            format!("mismatched range bounds ({} .. {})", a.kind(), b.kind()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(field: &str, value: impl Into<PredicateValue>, negated: bool) -> String {
        translate(field, value.into(), negated).unwrap().render()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(render("user_id", 1, false), "(user_id=1)");
        assert_eq!(render("user_id", 1, true), "(user_id<>1)");
        assert_eq!(render("dummy", "q", false), "(dummy='q')");
        assert_eq!(render("dummy", "a", true), "(dummy<>'a')");
        assert_eq!(render("active", false, false), "(active=false)");
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            render("user_id", vec![1, 2, 3], false),
            "(user_id=1 or user_id=2 or user_id=3)"
        );
        assert_eq!(
            render("user_id", [1, 2, 3], true),
            "(user_id<>1 and user_id<>2 and user_id<>3)"
        );
    }

    #[test]
    fn test_ranges() {
        assert_eq!(render("user_id", 1..=4, false), "(user_id>1 and user_id<4)");
        assert_eq!(render("user_id", 1..=4, true), "(user_id<1 and user_id>4)");
        assert_eq!(render("load", 0.5..1.5, false), "(load>0.5 and load<1.5)");
    }

    #[test]
    fn test_patterns() {
        let pattern = Pattern::new("^du.*").unwrap();
        assert_eq!(render("dummy", pattern.clone(), false), "(dummy=~/^du.*/)");
        assert_eq!(render("dummy", pattern, true), "(dummy!~/^du.*/)");
    }

    #[test]
    fn test_raw() {
        assert_eq!(raw("time > now() - 1d").unwrap().render(), "(time > now() - 1d)");
        assert!(raw("  ").is_err());
    }

    #[test]
    fn test_invalid_values() {
        let empty: Vec<i64> = Vec::new();
        assert!(matches!(
            translate("user_id", empty.into(), false),
            Err(QueryError::InvalidPredicateValue { .. })
        ));
        assert!(translate("flag", (false..=true).into(), false).is_err());
        assert!(translate("v", PredicateValue::Range(1.into(), "x".into()), false).is_err());
        assert!(translate("v", f64::NAN.into(), false).is_err());
        assert!(translate("", 1.into(), false).is_err());
    }
}
