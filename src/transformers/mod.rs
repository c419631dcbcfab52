//! Frame transformers.
//!
//! Each transformer is a pure function from a list of frames (plus its options) to a new list
//! of frames. Input frames are never modified. A transformer that cannot apply meaningfully
//! returns its input unchanged.
//!
//! Transformers are authored as [`TransformerConfig`] records (`{ id, disabled?, options }`) and
//! decoded into a [`Transformer`] with [`Transformer::from_config`]. The pipeline runner in
//! [`crate::execution`] chains them.
//!
//! ```rust
//! use frame_transformers::transformers::{TransformContext, Transformer, TransformerConfig};
//! use frame_transformers::types::{DataFrame, Field, FieldType, Value};
//!
//! let frame = DataFrame::new(vec![
//!     Field::new("Time", FieldType::Time, vec![Value::from(1000), Value::from(2000)]),
//!     Field::new("Value", FieldType::Number, vec![Value::from(1), Value::from(2)]),
//! ]);
//! let config: TransformerConfig = serde_json::from_value(serde_json::json!({
//!     "id": "ignoreRow",
//!     "options": { "position": "first" }
//! }))
//! .unwrap();
//! let transformer = Transformer::from_config(&config).unwrap();
//! let out = transformer.apply(&[frame], &TransformContext::default());
//! assert_eq!(out[0].length, 1);
//! ```

pub mod append;
pub mod config_from_query;
pub mod filter_by_ref_id;
pub mod filter_by_value;
pub mod format_time;
pub mod grouping_to_matrix;
pub mod ignore_row;
pub mod limit;
pub mod merge;
pub mod organize;
pub mod rows_to_fields;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, FrameResult};
use crate::types::DataFrame;

pub use config_from_query::ConfigFromQueryOptions;
pub use filter_by_ref_id::FilterByRefIdOptions;
pub use filter_by_value::{FilterByValueFilter, FilterByValueMatch, FilterByValueOptions, FilterByValueType};
pub use format_time::FormatTimeOptions;
pub use grouping_to_matrix::{GroupingToMatrixOptions, SpecialValue};
pub use ignore_row::{IgnoreRowOptions, RowPosition};
pub use limit::LimitOptions;
pub use organize::{OrderOptions, OrganizeOptions};
pub use rows_to_fields::RowsToFieldsOptions;

/// Serialized form of one pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformerConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    #[serde(default)]
    pub options: serde_json::Value,
}

impl TransformerConfig {
    pub fn new(id: impl Into<String>, options: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            disabled: false,
            options,
        }
    }
}

/// Every supported transformer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformerId {
    ConfigFromQuery,
    GroupingToMatrix,
    RowsToFields,
    FilterByValue,
    Order,
    Organize,
    Append,
    Merge,
    FormatTime,
    IgnoreRow,
    Limit,
    FilterByRefId,
}

impl TransformerId {
    pub const ALL: [TransformerId; 12] = [
        TransformerId::ConfigFromQuery,
        TransformerId::GroupingToMatrix,
        TransformerId::RowsToFields,
        TransformerId::FilterByValue,
        TransformerId::Order,
        TransformerId::Organize,
        TransformerId::Append,
        TransformerId::Merge,
        TransformerId::FormatTime,
        TransformerId::IgnoreRow,
        TransformerId::Limit,
        TransformerId::FilterByRefId,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformerId::ConfigFromQuery => "configFromData",
            TransformerId::GroupingToMatrix => "groupingToMatrix",
            TransformerId::RowsToFields => "rowsToFields",
            TransformerId::FilterByValue => "filterByValue",
            TransformerId::Order => "order",
            TransformerId::Organize => "organize",
            TransformerId::Append => "append",
            TransformerId::Merge => "merge",
            TransformerId::FormatTime => "formatTime",
            TransformerId::IgnoreRow => "ignoreRow",
            TransformerId::Limit => "limit",
            TransformerId::FilterByRefId => "filterByRefId",
        }
    }
}

impl fmt::Display for TransformerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformerId {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "configFromQuery" {
            return Ok(TransformerId::ConfigFromQuery);
        }
        TransformerId::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| FrameError::UnknownTransformer { id: s.to_string() })
    }
}

/// A decoded transformer with its options.
#[derive(Debug, Clone)]
pub enum Transformer {
    ConfigFromQuery(ConfigFromQueryOptions),
    GroupingToMatrix(GroupingToMatrixOptions),
    RowsToFields(RowsToFieldsOptions),
    FilterByValue(FilterByValueOptions),
    Order(OrderOptions),
    Organize(OrganizeOptions),
    Append,
    Merge,
    FormatTime(FormatTimeOptions),
    IgnoreRow(IgnoreRowOptions),
    Limit(LimitOptions),
    FilterByRefId(FilterByRefIdOptions),
}

impl Transformer {
    /// Decode a transformer from its serialized form. `disabled` is not interpreted here.
    pub fn from_config(config: &TransformerConfig) -> FrameResult<Self> {
        let id: TransformerId = config.id.parse()?;
        let opts = &config.options;
        Ok(match id {
            TransformerId::ConfigFromQuery => Transformer::ConfigFromQuery(decode(id, opts)?),
            TransformerId::GroupingToMatrix => Transformer::GroupingToMatrix(decode(id, opts)?),
            TransformerId::RowsToFields => Transformer::RowsToFields(decode(id, opts)?),
            TransformerId::FilterByValue => Transformer::FilterByValue(decode(id, opts)?),
            TransformerId::Order => Transformer::Order(decode(id, opts)?),
            TransformerId::Organize => Transformer::Organize(decode(id, opts)?),
            TransformerId::Append => Transformer::Append,
            TransformerId::Merge => Transformer::Merge,
            TransformerId::FormatTime => Transformer::FormatTime(decode(id, opts)?),
            TransformerId::IgnoreRow => Transformer::IgnoreRow(decode(id, opts)?),
            TransformerId::Limit => Transformer::Limit(decode(id, opts)?),
            TransformerId::FilterByRefId => Transformer::FilterByRefId(decode(id, opts)?),
        })
    }

    pub fn id(&self) -> TransformerId {
        match self {
            Transformer::ConfigFromQuery(_) => TransformerId::ConfigFromQuery,
            Transformer::GroupingToMatrix(_) => TransformerId::GroupingToMatrix,
            Transformer::RowsToFields(_) => TransformerId::RowsToFields,
            Transformer::FilterByValue(_) => TransformerId::FilterByValue,
            Transformer::Order(_) => TransformerId::Order,
            Transformer::Organize(_) => TransformerId::Organize,
            Transformer::Append => TransformerId::Append,
            Transformer::Merge => TransformerId::Merge,
            Transformer::FormatTime(_) => TransformerId::FormatTime,
            Transformer::IgnoreRow(_) => TransformerId::IgnoreRow,
            Transformer::Limit(_) => TransformerId::Limit,
            Transformer::FilterByRefId(_) => TransformerId::FilterByRefId,
        }
    }

    /// Whether applying this transformer to `frames` would do anything useful.
    ///
    /// This is an authoring hint; [`Transformer::apply`] does not consult it.
    pub fn is_applicable(&self, frames: &[DataFrame]) -> bool {
        match self {
            Transformer::GroupingToMatrix(_) => grouping_to_matrix::is_applicable(frames),
            Transformer::Append => frames.len() > 1,
            _ => !frames.is_empty(),
        }
    }

    /// Apply to one batch of frames.
    pub fn apply(&self, frames: &[DataFrame], ctx: &TransformContext) -> Vec<DataFrame> {
        match self {
            Transformer::ConfigFromQuery(o) => config_from_query::config_from_query(frames, o),
            Transformer::GroupingToMatrix(o) => grouping_to_matrix::grouping_to_matrix(frames, o),
            Transformer::RowsToFields(o) => frames.iter().map(|f| rows_to_fields::rows_to_fields(f, o)).collect(),
            Transformer::FilterByValue(o) => filter_by_value::filter_by_value(frames, o, ctx),
            Transformer::Order(o) => organize::order(frames, o),
            Transformer::Organize(o) => organize::organize(frames, o),
            Transformer::Append => append::append(frames),
            Transformer::Merge => merge::merge(frames),
            Transformer::FormatTime(o) => format_time::format_time(frames, o),
            Transformer::IgnoreRow(o) => frames.iter().map(|f| ignore_row::ignore_row(f, o)).collect(),
            Transformer::Limit(o) => frames.iter().map(|f| limit::limit(f, o)).collect(),
            Transformer::FilterByRefId(o) => filter_by_ref_id::filter_by_ref_id(frames, o),
        }
    }
}

fn decode<T: DeserializeOwned + Default>(id: TransformerId, options: &serde_json::Value) -> FrameResult<T> {
    crate::matchers::decode_options(id.as_str(), options)
}

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(\w+)\}|\$(\w+)").expect("variable pattern is valid")
});

/// Per-invocation context shared by every transformer of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformContext {
    variables: HashMap<String, String>,
}

impl TransformContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template variable (name without the `$`).
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Replace `$name` and `${name}` with known variables; unknown references are kept.
    pub fn interpolate(&self, text: &str) -> String {
        if self.variables.is_empty() || !text.contains('$') {
            return text.to_string();
        }
        VARIABLE
            .replace_all(text, |caps: &Captures<'_>| {
                let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                self.variables
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Interpolate every string inside a JSON value.
    pub fn interpolate_json(&self, value: &serde_json::Value) -> serde_json::Value {
        match value {
            serde_json::Value::String(s) => serde_json::Value::String(self.interpolate(s)),
            serde_json::Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(|v| self.interpolate_json(v)).collect())
            }
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.interpolate_json(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}
