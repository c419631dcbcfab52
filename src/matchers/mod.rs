//! Predicates over values and fields.
//!
//! - [`value`]: per-cell predicates used by the filter-by-value transformer
//! - [`field`]: per-field predicates used to select which fields a transformer touches
//!
//! Both kinds are built from a [`MatcherConfig`], the `{ id, options }` record stored in
//! transformer options. Building a matcher is the only step that can fail; a built matcher
//! never fails and answers `false` for values it cannot compare.

pub mod field;
pub mod value;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, FrameResult};

pub use field::{FieldMatcher, FieldMatcherId};
pub use value::{ValueMatcher, ValueMatcherId, ValueMatcherOptions};

/// Serialized form of a matcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    pub id: String,
    #[serde(default)]
    pub options: serde_json::Value,
}

impl MatcherConfig {
    pub fn new(id: impl Into<String>, options: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            options,
        }
    }
}

/// Decode matcher options, treating a missing (`null`) options value as the defaults.
pub(crate) fn decode_options<T>(id: &str, options: &serde_json::Value) -> FrameResult<T>
where
    T: DeserializeOwned + Default,
{
    if options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(options.clone()).map_err(|e| FrameError::InvalidOptions {
        id: id.to_string(),
        message: e.to_string(),
    })
}
