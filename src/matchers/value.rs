//! Value matchers: predicates over a single cell of a field.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{decode_options, MatcherConfig};
use crate::error::{FrameError, FrameResult};
use crate::types::{parse_int_prefix, Field, FieldType, Value};

/// Every supported value matcher kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueMatcherId {
    Equal,
    NotEqual,
    IsNull,
    IsNotNull,
    IsUndefined,
    IsNotUndefined,
    Greater,
    GreaterOrEqual,
    Lower,
    LowerOrEqual,
    Between,
    Regex,
    Substring,
    NotSubstring,
    Like,
    NotLike,
}

/// Options of a value matcher. The variant required depends on the matcher kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ValueMatcherOptions {
    /// For the null/undefined checks.
    #[default]
    None,
    /// `{ value }`.
    Basic { value: Value },
    /// `{ from, to }`.
    Range { from: Value, to: Value },
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct BasicOptions {
    value: Value,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RangeOptions {
    from: Value,
    to: Value,
}

impl ValueMatcherId {
    pub const ALL: [ValueMatcherId; 16] = [
        ValueMatcherId::Equal,
        ValueMatcherId::NotEqual,
        ValueMatcherId::IsNull,
        ValueMatcherId::IsNotNull,
        ValueMatcherId::IsUndefined,
        ValueMatcherId::IsNotUndefined,
        ValueMatcherId::Greater,
        ValueMatcherId::GreaterOrEqual,
        ValueMatcherId::Lower,
        ValueMatcherId::LowerOrEqual,
        ValueMatcherId::Between,
        ValueMatcherId::Regex,
        ValueMatcherId::Substring,
        ValueMatcherId::NotSubstring,
        ValueMatcherId::Like,
        ValueMatcherId::NotLike,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueMatcherId::Equal => "equal",
            ValueMatcherId::NotEqual => "notEqual",
            ValueMatcherId::IsNull => "isNull",
            ValueMatcherId::IsNotNull => "isNotNull",
            ValueMatcherId::IsUndefined => "isUndefined",
            ValueMatcherId::IsNotUndefined => "isNotUndefined",
            ValueMatcherId::Greater => "greater",
            ValueMatcherId::GreaterOrEqual => "greaterOrEqual",
            ValueMatcherId::Lower => "lower",
            ValueMatcherId::LowerOrEqual => "lowerOrEqual",
            ValueMatcherId::Between => "between",
            ValueMatcherId::Regex => "regex",
            ValueMatcherId::Substring => "substring",
            ValueMatcherId::NotSubstring => "notSubstring",
            ValueMatcherId::Like => "like",
            ValueMatcherId::NotLike => "notLike",
        }
    }

    fn is_numeric_comparison(&self) -> bool {
        matches!(
            self,
            ValueMatcherId::Greater
                | ValueMatcherId::GreaterOrEqual
                | ValueMatcherId::Lower
                | ValueMatcherId::LowerOrEqual
        )
    }

    /// Whether this matcher is meaningful for `field`.
    ///
    /// `substring`/`notSubstring` are restricted to string fields while `like`/`notLike`, which
    /// test the same thing, are offered for every field.
    pub fn is_applicable(&self, field: &Field) -> bool {
        match self {
            id if id.is_numeric_comparison() => field.field_type == FieldType::Number,
            ValueMatcherId::Between => {
                matches!(field.field_type, FieldType::Number | FieldType::Time)
            }
            ValueMatcherId::Substring | ValueMatcherId::NotSubstring => {
                field.field_type == FieldType::String
            }
            _ => true,
        }
    }

    /// Options to start from when authoring a matcher for `field`.
    pub fn default_options(&self, field: &Field) -> ValueMatcherOptions {
        match self {
            ValueMatcherId::IsNull
            | ValueMatcherId::IsNotNull
            | ValueMatcherId::IsUndefined
            | ValueMatcherId::IsNotUndefined => ValueMatcherOptions::None,
            id if id.is_numeric_comparison() => ValueMatcherOptions::Basic {
                value: Value::Number(0.0),
            },
            ValueMatcherId::Between if field.field_type == FieldType::Time => {
                ValueMatcherOptions::Range {
                    from: Value::from("$__from"),
                    to: Value::from("$__to"),
                }
            }
            ValueMatcherId::Between => ValueMatcherOptions::Range {
                from: Value::Number(0.0),
                to: Value::Number(100.0),
            },
            _ => ValueMatcherOptions::Basic {
                value: Value::from(""),
            },
        }
    }

    /// Decode the options record this kind expects.
    pub fn decode_options(&self, options: &serde_json::Value) -> FrameResult<ValueMatcherOptions> {
        let id = self.as_str();
        Ok(match self.default_options(&Field::default()) {
            ValueMatcherOptions::None => ValueMatcherOptions::None,
            ValueMatcherOptions::Basic { .. } => {
                let raw: BasicOptions = decode_options(id, options)?;
                ValueMatcherOptions::Basic { value: raw.value }
            }
            ValueMatcherOptions::Range { .. } => {
                let raw: RangeOptions = decode_options(id, options)?;
                ValueMatcherOptions::Range {
                    from: raw.from,
                    to: raw.to,
                }
            }
        })
    }

    /// Human description of what the configured matcher keeps.
    pub fn display_text(&self, options: &ValueMatcherOptions) -> String {
        let value = match options {
            ValueMatcherOptions::Basic { value } => value.to_string(),
            _ => String::new(),
        };
        match (self, options) {
            (ValueMatcherId::Equal, _) => format!("Matches all rows where field is equal to {value}."),
            (ValueMatcherId::NotEqual, _) => {
                format!("Matches all rows where field is different than {value}.")
            }
            (ValueMatcherId::IsNull, _) => "Matches all rows where field is null.".to_string(),
            (ValueMatcherId::IsNotNull, _) => "Matches all rows where field is not null.".to_string(),
            (ValueMatcherId::IsUndefined, _) => "Matches all rows where field is undefined.".to_string(),
            (ValueMatcherId::IsNotUndefined, _) => {
                "Matches all rows where field is not undefined.".to_string()
            }
            (ValueMatcherId::Greater, _) => {
                format!("Matches all rows where field value is greater than: {value}.")
            }
            (ValueMatcherId::GreaterOrEqual, _) => {
                format!("Matches all rows where field value is greater than or equal to: {value}.")
            }
            (ValueMatcherId::Lower, _) => {
                format!("Matches all rows where field value is lower than: {value}.")
            }
            (ValueMatcherId::LowerOrEqual, _) => {
                format!("Matches all rows where field value is lower than or equal to: {value}.")
            }
            (ValueMatcherId::Between, ValueMatcherOptions::Range { from, to }) => {
                format!("Matches all rows where field value is between {from} and {to}.")
            }
            (ValueMatcherId::Between, _) => "Matches all rows where field value is in a range.".to_string(),
            (ValueMatcherId::Regex, _) => {
                format!("Matches all rows where field value matches the regex: {value}.")
            }
            (ValueMatcherId::Substring, _) => {
                format!("Matches all rows where field value contains: {value}.")
            }
            (ValueMatcherId::NotSubstring, _) => {
                format!("Matches all rows where field value does not contain: {value}.")
            }
            (ValueMatcherId::Like, _) => format!("Matches all rows where field value is like: {value}."),
            (ValueMatcherId::NotLike, _) => {
                format!("Matches all rows where field value is not like: {value}.")
            }
        }
    }

    /// Build the predicate. Patterns are compiled here, once per call.
    pub fn get(&self, options: &ValueMatcherOptions) -> FrameResult<ValueMatcher> {
        let mismatch = || FrameError::InvalidOptions {
            id: self.as_str().to_string(),
            message: format!("unexpected options {options:?}"),
        };
        let operand = match (self, options) {
            (
                ValueMatcherId::IsNull
                | ValueMatcherId::IsNotNull
                | ValueMatcherId::IsUndefined
                | ValueMatcherId::IsNotUndefined,
                _,
            ) => Operand::None,
            (ValueMatcherId::Equal | ValueMatcherId::NotEqual, ValueMatcherOptions::Basic { value }) => {
                Operand::Value(value.clone())
            }
            (id, ValueMatcherOptions::Basic { value }) if id.is_numeric_comparison() => {
                Operand::Number(value.as_numeric().unwrap_or(f64::NAN))
            }
            (ValueMatcherId::Between, ValueMatcherOptions::Range { from, to }) => {
                Operand::Range(range_bound(from), range_bound(to))
            }
            (ValueMatcherId::Regex, ValueMatcherOptions::Basic { value }) => {
                let pattern = operand_text(value);
                let re = Regex::new(&pattern).map_err(|source| FrameError::InvalidRegex { pattern, source })?;
                Operand::Pattern(re)
            }
            (
                ValueMatcherId::Substring
                | ValueMatcherId::NotSubstring
                | ValueMatcherId::Like
                | ValueMatcherId::NotLike,
                ValueMatcherOptions::Basic { value },
            ) => Operand::Text(operand_text(value)),
            _ => return Err(mismatch()),
        };
        Ok(ValueMatcher { id: *self, operand })
    }
}

impl fmt::Display for ValueMatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueMatcherId {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueMatcherId::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| FrameError::UnknownMatcher { id: s.to_string() })
    }
}

/// Range bounds may arrive as numbers or as (possibly templated) strings; strings are read as
/// base-10 integers.
fn range_bound(v: &Value) -> f64 {
    match v {
        Value::Number(n) => *n,
        Value::String(s) => parse_int_prefix(s).unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

fn operand_text(v: &Value) -> String {
    if v.is_nullish() { String::new() } else { v.to_string() }
}

#[derive(Debug, Clone)]
enum Operand {
    None,
    Value(Value),
    Number(f64),
    Range(f64, f64),
    Pattern(Regex),
    Text(String),
}

/// A built value predicate.
#[derive(Debug, Clone)]
pub struct ValueMatcher {
    id: ValueMatcherId,
    operand: Operand,
}

impl ValueMatcher {
    /// Decode and build a matcher from its serialized form.
    pub fn from_config(config: &MatcherConfig) -> FrameResult<Self> {
        let id: ValueMatcherId = config.id.parse()?;
        let options = id.decode_options(&config.options)?;
        id.get(&options)
    }

    pub fn id(&self) -> ValueMatcherId {
        self.id
    }

    /// Test the value at `index` of `field`. Out-of-range indices never match.
    pub fn matches(&self, index: usize, field: &Field) -> bool {
        field
            .values
            .get(index)
            .is_some_and(|v| self.matches_value(v))
    }

    /// Test a single value.
    pub fn matches_value(&self, value: &Value) -> bool {
        use ValueMatcherId as Id;

        match (self.id, &self.operand) {
            (Id::Equal, Operand::Value(expected)) => value.loose_eq(expected),
            (Id::NotEqual, Operand::Value(expected)) => !value.loose_eq(expected),
            (Id::IsNull, _) => value.is_nullish(),
            (Id::IsNotNull, _) => !value.is_nullish(),
            (Id::IsUndefined, _) => matches!(value, Value::Undefined),
            (Id::IsNotUndefined, _) => !matches!(value, Value::Undefined),
            (Id::Greater, Operand::Number(o)) => value.as_numeric().is_some_and(|n| n > *o),
            (Id::GreaterOrEqual, Operand::Number(o)) => value.as_numeric().is_some_and(|n| n >= *o),
            (Id::Lower, Operand::Number(o)) => value.as_numeric().is_some_and(|n| n < *o),
            (Id::LowerOrEqual, Operand::Number(o)) => value.as_numeric().is_some_and(|n| n <= *o),
            (Id::Between, Operand::Range(from, to)) => {
                value.as_numeric().is_some_and(|n| n > *from && n < *to)
            }
            (Id::Regex, Operand::Pattern(re)) => re.is_match(&value.to_string()),
            (Id::Substring | Id::Like, Operand::Text(needle)) => {
                contains(value, needle).unwrap_or(false)
            }
            (Id::NotSubstring | Id::NotLike, Operand::Text(needle)) => {
                contains(value, needle).is_some_and(|found| !found)
            }
            _ => false,
        }
    }
}

fn contains(value: &Value, needle: &str) -> Option<bool> {
    match value {
        Value::Null | Value::Undefined => None,
        Value::String(s) => Some(s.contains(needle)),
        other => Some(other.to_string().contains(needle)),
    }
}
