//! Calculation functions
//!
//! A relation holds at most one pending calculation. When present it replaces
//! the select list: `select percentile(value,95) from ...`.

use std::fmt;

/// Aggregate and selector functions understood by the datastore
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    Count,
    Min,
    Max,
    Mean,
    Mode,
    Median,
    Distinct,
    Derivative,
    Stddev,
    Sum,
    First,
    Last,
    Difference,
    Histogram,
    Percentile,
    Top,
    Bottom,
    /// Any other function name, rendered as given
    Custom(String),
}

impl Function {
    /// All predefined functions
    pub fn all() -> &'static [Function] {
        &[
            Function::Count,
            Function::Min,
            Function::Max,
            Function::Mean,
            Function::Mode,
            Function::Median,
            Function::Distinct,
            Function::Derivative,
            Function::Stddev,
            Function::Sum,
            Function::First,
            Function::Last,
            Function::Difference,
            Function::Histogram,
            Function::Percentile,
            Function::Top,
            Function::Bottom,
        ]
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
            Self::Mean => "mean",
            Self::Mode => "mode",
            Self::Median => "median",
            Self::Distinct => "distinct",
            Self::Derivative => "derivative",
            Self::Stddev => "stddev",
            Self::Sum => "sum",
            Self::First => "first",
            Self::Last => "last",
            Self::Difference => "difference",
            Self::Histogram => "histogram",
            Self::Percentile => "percentile",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Custom(name) => name,
        }
    }
}

impl From<&str> for Function {
    fn from(name: &str) -> Self {
        Function::all()
            .iter()
            .find(|f| f.name() == name)
            .cloned()
            .unwrap_or_else(|| Function::Custom(name.to_string()))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An argument of a calculation, rendered without quoting
#[derive(Debug, Clone, PartialEq)]
pub enum CalcArg {
    Field(String),
    Integer(i64),
    Float(f64),
}

impl From<&str> for CalcArg {
    fn from(field: &str) -> Self {
        CalcArg::Field(field.to_string())
    }
}

impl From<String> for CalcArg {
    fn from(field: String) -> Self {
        CalcArg::Field(field)
    }
}

impl From<i64> for CalcArg {
    fn from(n: i64) -> Self {
        CalcArg::Integer(n)
    }
}

impl From<i32> for CalcArg {
    fn from(n: i32) -> Self {
        CalcArg::Integer(n as i64)
    }
}

impl From<f64> for CalcArg {
    fn from(x: f64) -> Self {
        CalcArg::Float(x)
    }
}

impl fmt::Display for CalcArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(x) => write!(f, "{}", x),
        }
    }
}

/// A function applied to its arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub function: Function,
    pub args: Vec<CalcArg>,
}

impl Calculation {
    pub fn new(function: impl Into<Function>, args: Vec<CalcArg>) -> Self {
        Self {
            function: function.into(),
            args,
        }
    }

    /// Render as `function(arg1,arg2)`
    pub fn render(&self) -> String {
        let args: Vec<String> = self.args.iter().map(ToString::to_string).collect();
        format!("{}({})", self.function, args.join(","))
    }
}
