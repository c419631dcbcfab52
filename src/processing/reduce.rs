//! Field reducers: aggregate a field's values into one result.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::FrameError;
use crate::types::{Field, Value};

/// Built-in reductions over a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReducerId {
    /// Smallest numeric value, ignoring non-numbers.
    Min,
    /// Largest numeric value, ignoring non-numbers.
    Max,
    /// Mean of numeric values.
    Mean,
    /// Sum of numeric values.
    Sum,
    /// Number of values, nulls included.
    Count,
    /// `max - min`.
    Range,
    First,
    FirstNotNull,
    Last,
    LastNotNull,
    /// Every value, in order.
    AllValues,
    /// Distinct values in first-seen order.
    UniqueValues,
    /// Number of distinct non-null values.
    DistinctCount,
    /// `true` when no value is non-null.
    AllIsNull,
    /// `true` when every non-null value is the number zero.
    AllIsZero,
}

impl ReducerId {
    pub const ALL: [ReducerId; 15] = [
        ReducerId::Min,
        ReducerId::Max,
        ReducerId::Mean,
        ReducerId::Sum,
        ReducerId::Count,
        ReducerId::Range,
        ReducerId::First,
        ReducerId::FirstNotNull,
        ReducerId::Last,
        ReducerId::LastNotNull,
        ReducerId::AllValues,
        ReducerId::UniqueValues,
        ReducerId::DistinctCount,
        ReducerId::AllIsNull,
        ReducerId::AllIsZero,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReducerId::Min => "min",
            ReducerId::Max => "max",
            ReducerId::Mean => "mean",
            ReducerId::Sum => "sum",
            ReducerId::Count => "count",
            ReducerId::Range => "range",
            ReducerId::First => "first",
            ReducerId::FirstNotNull => "firstNotNull",
            ReducerId::Last => "last",
            ReducerId::LastNotNull => "lastNotNull",
            ReducerId::AllValues => "allValues",
            ReducerId::UniqueValues => "uniqueValues",
            ReducerId::DistinctCount => "distinctCount",
            ReducerId::AllIsNull => "allIsNull",
            ReducerId::AllIsZero => "allIsZero",
        }
    }
}

impl fmt::Display for ReducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReducerId {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReducerId::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| FrameError::InvalidOptions {
                id: "reducer".to_string(),
                message: format!("unknown reducer '{s}'"),
            })
    }
}

/// Result of a reduction: one value, or a list for the list-valued reducers.
#[derive(Debug, Clone, PartialEq)]
pub enum Reduction {
    Scalar(Value),
    Values(Vec<Value>),
}

impl Reduction {
    /// The boolean held by a scalar `Bool` result.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Reduction::Scalar(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// The scalar result, if this is not a list.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Reduction::Scalar(v) => Some(v),
            Reduction::Values(_) => None,
        }
    }
}

/// Reduce a field's values.
pub fn reduce_field(field: &Field, reducer: ReducerId) -> Reduction {
    reduce_values(&field.values, reducer)
}

/// Reduce a slice of values.
///
/// Numeric reducers ignore values that are not numbers and return `Null` when nothing numeric
/// is left. `first`/`last` on an empty slice are `Null`.
pub fn reduce_values(values: &[Value], reducer: ReducerId) -> Reduction {
    let numbers = || values.iter().filter_map(Value::as_f64).filter(|n| !n.is_nan());
    let scalar = |v: Option<f64>| Reduction::Scalar(v.map(Value::Number).unwrap_or(Value::Null));

    match reducer {
        ReducerId::Min => scalar(numbers().reduce(f64::min)),
        ReducerId::Max => scalar(numbers().reduce(f64::max)),
        ReducerId::Sum => scalar(numbers().reduce(|a, b| a + b)),
        ReducerId::Mean => {
            let (sum, n) = numbers().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            scalar((n > 0).then(|| sum / n as f64))
        }
        ReducerId::Range => {
            let min = numbers().reduce(f64::min);
            let max = numbers().reduce(f64::max);
            scalar(min.zip(max).map(|(lo, hi)| hi - lo))
        }
        ReducerId::Count => Reduction::Scalar(Value::Number(values.len() as f64)),
        ReducerId::First => Reduction::Scalar(values.first().cloned().unwrap_or_default()),
        ReducerId::Last => Reduction::Scalar(values.last().cloned().unwrap_or_default()),
        ReducerId::FirstNotNull => Reduction::Scalar(
            values
                .iter()
                .find(|v| !v.is_nullish())
                .cloned()
                .unwrap_or_default(),
        ),
        ReducerId::LastNotNull => Reduction::Scalar(
            values
                .iter()
                .rev()
                .find(|v| !v.is_nullish())
                .cloned()
                .unwrap_or_default(),
        ),
        ReducerId::AllValues => Reduction::Values(values.to_vec()),
        ReducerId::UniqueValues => Reduction::Values(unique(values).into_values().collect()),
        ReducerId::DistinctCount => {
            let n = unique(values).values().filter(|v| !v.is_nullish()).count();
            Reduction::Scalar(Value::Number(n as f64))
        }
        ReducerId::AllIsNull => Reduction::Scalar(Value::Bool(values.iter().all(Value::is_nullish))),
        ReducerId::AllIsZero => Reduction::Scalar(Value::Bool(
            values
                .iter()
                .filter(|v| !v.is_nullish())
                .all(|v| v.as_f64() == Some(0.0)),
        )),
    }
}

fn unique(values: &[Value]) -> IndexMap<crate::types::ValueKey, Value> {
    let mut out = IndexMap::new();
    for v in values {
        out.entry(v.key()).or_insert_with(|| v.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{reduce_field, reduce_values, ReducerId, Reduction};
    use crate::types::{Field, FieldType, Value};

    fn numeric_field_with_nulls() -> Field {
        Field::new(
            "score",
            FieldType::Number,
            vec![Value::from(10.0), Value::Null, Value::from(5.5), Value::Null],
        )
    }

    #[test]
    fn numeric_reducers_ignore_nulls() {
        let f = numeric_field_with_nulls();
        assert_eq!(reduce_field(&f, ReducerId::Sum), Reduction::Scalar(Value::from(15.5)));
        assert_eq!(reduce_field(&f, ReducerId::Min), Reduction::Scalar(Value::from(5.5)));
        assert_eq!(reduce_field(&f, ReducerId::Max), Reduction::Scalar(Value::from(10.0)));
        assert_eq!(reduce_field(&f, ReducerId::Mean), Reduction::Scalar(Value::from(7.75)));
        assert_eq!(reduce_field(&f, ReducerId::Range), Reduction::Scalar(Value::from(4.5)));
    }

    #[test]
    fn count_includes_nulls() {
        let f = numeric_field_with_nulls();
        assert_eq!(reduce_field(&f, ReducerId::Count), Reduction::Scalar(Value::from(4)));
    }

    #[test]
    fn first_last_variants() {
        let f = Field::new(
            "x",
            FieldType::Number,
            vec![Value::Null, Value::from(1), Value::from(2), Value::Null],
        );
        assert_eq!(reduce_field(&f, ReducerId::First), Reduction::Scalar(Value::Null));
        assert_eq!(reduce_field(&f, ReducerId::FirstNotNull), Reduction::Scalar(Value::from(1)));
        assert_eq!(reduce_field(&f, ReducerId::LastNotNull), Reduction::Scalar(Value::from(2)));
        assert_eq!(reduce_field(&f, ReducerId::Last), Reduction::Scalar(Value::Null));
    }

    #[test]
    fn numeric_reducers_return_null_when_nothing_numeric() {
        let values = vec![Value::Null, Value::from("a")];
        assert_eq!(reduce_values(&values, ReducerId::Sum), Reduction::Scalar(Value::Null));
        assert_eq!(reduce_values(&values, ReducerId::Mean), Reduction::Scalar(Value::Null));
    }

    #[test]
    fn all_is_null_and_all_is_zero() {
        let nulls = vec![Value::Null, Value::Undefined];
        assert_eq!(reduce_values(&nulls, ReducerId::AllIsNull).as_bool(), Some(true));
        let zeros = vec![Value::from(0), Value::Null, Value::from(0.0)];
        assert_eq!(reduce_values(&zeros, ReducerId::AllIsZero).as_bool(), Some(true));
        assert_eq!(reduce_values(&zeros, ReducerId::AllIsNull).as_bool(), Some(false));
        let mixed = vec![Value::from(0), Value::from(1)];
        assert_eq!(reduce_values(&mixed, ReducerId::AllIsZero).as_bool(), Some(false));
    }

    #[test]
    fn unique_values_keep_first_seen_order() {
        let values = vec![Value::from("b"), Value::from("a"), Value::from("b"), Value::Null];
        assert_eq!(
            reduce_values(&values, ReducerId::UniqueValues),
            Reduction::Values(vec![Value::from("b"), Value::from("a"), Value::Null])
        );
        assert_eq!(
            reduce_values(&values, ReducerId::DistinctCount),
            Reduction::Scalar(Value::from(2))
        );
    }

    #[test]
    fn reducer_ids_parse_from_camel_case() {
        assert_eq!("lastNotNull".parse::<ReducerId>().unwrap(), ReducerId::LastNotNull);
        assert!("median".parse::<ReducerId>().is_err());
    }
}
