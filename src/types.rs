//! Core data model: typed values, fields and frames.
//!
//! A [`DataFrame`] is an ordered list of [`Field`]s that all hold the same number of values.
//! Transformers treat frames as immutable values and always build new frames for their output.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{FrameError, FrameResult};
use crate::field_config::FieldConfig;

/// Per-series identity attached to a field, distinct from its name.
pub type Labels = BTreeMap<String, String>;

/// Logical type of a [`Field`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Epoch milliseconds.
    Time,
    /// 64-bit float.
    Number,
    /// UTF-8 string.
    String,
    /// Boolean.
    Boolean,
    /// Anything else.
    #[default]
    Other,
}

impl FieldType {
    /// Infer a type from the first non-null value.
    pub fn infer(values: &[Value]) -> Self {
        values
            .iter()
            .find_map(|v| match v {
                Value::Number(_) => Some(Self::Number),
                Value::String(_) => Some(Self::String),
                Value::Bool(_) => Some(Self::Boolean),
                Value::Null | Value::Undefined => None,
            })
            .unwrap_or(Self::Other)
    }
}

/// A single cell value.
///
/// `Undefined` and `Null` are distinct: both are "nullish", but only `Undefined` marks a value
/// that was never set.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Never assigned.
    Undefined,
    /// Explicitly empty.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Number (times are epoch milliseconds).
    Number(f64),
    /// UTF-8 string.
    String(String),
}

impl Value {
    /// `true` for both `Null` and `Undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    /// The number held by a `Number` value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string held by a `String` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric reading of a number or a numeric string. Everything else, and `NaN`, is `None`.
    pub fn as_numeric(&self) -> Option<f64> {
        let n = match self {
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s)?,
            _ => return None,
        };
        (!n.is_nan()).then_some(n)
    }

    /// Lenient numeric coercion: numbers, numeric strings and booleans (`true` = 1).
    pub fn to_number_lenient(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            other => other.as_numeric(),
        }
    }

    /// Abstract ("loose") equality.
    ///
    /// `null` and `undefined` equal each other and nothing else; a number compared with a
    /// string or boolean compares numerically.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
                coerce_string(s) == *n
            }
            (Value::Bool(b), other) | (other, Value::Bool(b)) => {
                Value::Number(if *b { 1.0 } else { 0.0 }).loose_eq(other)
            }
            _ => false,
        }
    }

    pub(crate) fn key(&self) -> ValueKey {
        match self {
            Value::Undefined => ValueKey::Undefined,
            Value::Null => ValueKey::Null,
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Number(n) => {
                // -0 and 0 are the same key; all NaNs collapse to one.
                let n = if *n == 0.0 { 0.0 } else { *n };
                let bits = if n.is_nan() { f64::NAN.to_bits() } else { n.to_bits() };
                ValueKey::Number(bits)
            }
            Value::String(s) => ValueKey::String(s.clone()),
        }
    }
}

/// Hashable identity of a [`Value`], used for first-seen-order grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey {
    Undefined,
    Null,
    Bool(bool),
    Number(u64),
    String(String),
}

/// Parses a complete decimal numeric literal (surrounding whitespace allowed).
fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    match t {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    if !t
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    t.parse::<f64>().ok()
}

/// String-to-number coercion used by loose equality: blank strings are 0, junk is NaN.
fn coerce_string(s: &str) -> f64 {
    if s.trim().is_empty() {
        return 0.0;
    }
    parse_number(s).unwrap_or(f64::NAN)
}

/// Base-10 integer prefix parsing: leading whitespace, optional sign, then digits up to the
/// first non-digit. Returns `None` when no digit is found.
pub(crate) fn parse_int_prefix(s: &str) -> Option<f64> {
    let t = s.trim_start();
    let (sign, rest) = match t.as_bytes().first() {
        Some(b'-') => (-1.0, &t[1..]),
        Some(b'+') => (1.0, &t[1..]),
        _ => (1.0, t),
    };
    let digits: &str = &rest[..rest.bytes().take_while(u8::is_ascii_digit).count()];
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok().map(|n| sign * n)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => fmt_number(*n, f),
            Value::String(s) => f.write_str(s),
        }
    }
}

fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        write!(f, "{}", n as i128)
    } else {
        write!(f, "{n}")
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(f64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
            serde_json::Value::String(s) => Value::String(s.clone()),
            other => Value::String(other.to_string()),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Value::Number(_) => serializer.serialize_none(),
            Value::String(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(Value::from(&raw))
    }
}

/// A named, typed column of values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Column name. `None` only for fields synthesized from a null key (e.g. a pivot column).
    pub name: Option<String>,
    /// Logical type.
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Values, one per frame row.
    #[serde(default)]
    pub values: Vec<Value>,
    /// Display configuration.
    #[serde(default)]
    pub config: FieldConfig,
    /// Series labels.
    #[serde(default, skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
}

impl Field {
    /// Create a field with default config and no labels.
    pub fn new(name: impl Into<String>, field_type: FieldType, values: Vec<Value>) -> Self {
        Self {
            name: Some(name.into()),
            field_type,
            values,
            config: FieldConfig::default(),
            labels: Labels::new(),
        }
    }

    /// Replace the field config.
    pub fn with_config(mut self, config: FieldConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the field labels.
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// The field name, or `""` for an unnamed field.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` if the field holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A copy of this field holding only the values at `indices`.
    pub fn select(&self, indices: &[usize]) -> Field {
        Field {
            values: indices
                .iter()
                .map(|&i| self.values.get(i).cloned().unwrap_or_default())
                .collect(),
            ..self.clone()
        }
    }
}

/// A named, ordered collection of equal-length fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataFrame {
    /// Frame (series) name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Id of the query that produced the frame.
    #[serde(rename = "refId", skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    /// Columns.
    pub fields: Vec<Field>,
    /// Row count; equals every field's value count.
    pub length: usize,
}

impl DataFrame {
    /// Create a frame whose length is taken from the first field.
    ///
    /// Use [`DataFrame::try_new`] when the fields come from untrusted input.
    pub fn new(fields: Vec<Field>) -> Self {
        let length = fields.first().map(Field::len).unwrap_or(0);
        Self {
            name: None,
            ref_id: None,
            fields,
            length,
        }
    }

    /// Create a frame, checking that all fields have the same length.
    pub fn try_new(fields: Vec<Field>) -> FrameResult<Self> {
        let frame = Self::new(fields);
        frame.validate()?;
        Ok(frame)
    }

    /// Set the frame name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the query ref id.
    pub fn with_ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = Some(ref_id.into());
        self
    }

    /// A frame with the same name and ref id but new fields of length `length`.
    pub fn with_fields(&self, fields: Vec<Field>, length: usize) -> DataFrame {
        DataFrame {
            name: self.name.clone(),
            ref_id: self.ref_id.clone(),
            fields,
            length,
        }
    }

    /// Check the equal-length invariant.
    pub fn validate(&self) -> FrameResult<()> {
        for field in &self.fields {
            if field.len() != self.length {
                return Err(FrameError::LengthMismatch {
                    field: field.name().to_string(),
                    expected: self.length,
                    actual: field.len(),
                });
            }
        }
        Ok(())
    }

    /// First field with the given raw name.
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Index of the field whose display name equals `display_name`.
    pub fn index_of_display_name(&self, display_name: &str) -> Option<usize> {
        self.display_names().iter().position(|n| n == display_name)
    }

    /// Field whose display name equals `display_name`.
    pub fn field_by_display_name(&self, display_name: &str) -> Option<&Field> {
        self.index_of_display_name(display_name)
            .and_then(|i| self.fields.get(i))
    }

    /// Display names for every field, in field order.
    ///
    /// `config.displayName` wins; otherwise the name is suffixed with its formatted labels.
    /// Names that occur more than once in the frame get a 1-based ` N` suffix.
    pub fn display_names(&self) -> Vec<String> {
        let base: Vec<String> = self.fields.iter().map(|f| base_display_name(f, self)).collect();
        let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
        for name in &base {
            *totals.entry(name.as_str()).or_default() += 1;
        }
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        base.iter()
            .map(|name| {
                if totals[name.as_str()] < 2 {
                    return name.clone();
                }
                let n = seen.entry(name.as_str()).or_default();
                *n += 1;
                format!("{name} {n}")
            })
            .collect()
    }

    /// Display name of `field`, which must be a reference into this frame's fields.
    pub fn display_name_of(&self, field: &Field) -> String {
        match self.fields.iter().position(|f| std::ptr::eq(f, field)) {
            Some(i) => self.display_names().swap_remove(i),
            None => base_display_name(field, self),
        }
    }

    /// A copy of this frame holding only the rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> DataFrame {
        let fields = self.fields.iter().map(|f| f.select(indices)).collect();
        self.with_fields(fields, indices.len())
    }
}

fn base_display_name(field: &Field, frame: &DataFrame) -> String {
    if let Some(name) = &field.config.display_name {
        return name.clone();
    }
    let name = field.name();
    if !field.labels.is_empty() {
        let labels = format_labels(&field.labels);
        return if name.is_empty() { labels } else { format!("{name} {labels}") };
    }
    if name.is_empty() {
        if let Some(frame_name) = &frame.name {
            return frame_name.clone();
        }
    }
    name.to_string()
}

/// Formats labels as `{k1="v1", k2="v2"}`.
pub fn format_labels(labels: &Labels) -> String {
    let inner = labels
        .iter()
        .map(|(k, v)| format!("{k}=\"{v}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{inner}}}")
}

impl<'de> Deserialize<'de> for DataFrame {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            name: Option<String>,
            #[serde(rename = "refId", default)]
            ref_id: Option<String>,
            #[serde(default)]
            fields: Vec<Field>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let mut frame = DataFrame::try_new(raw.fields).map_err(serde::de::Error::custom)?;
        frame.name = raw.name;
        frame.ref_id = raw.ref_id;
        Ok(frame)
    }
}
