//! Field matchers: predicates that select whole fields.

use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{decode_options, MatcherConfig};
use crate::error::{FrameError, FrameResult};
use crate::processing::{reduce_field, ReducerId};
use crate::types::{DataFrame, Field, FieldType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldMatcherId {
    #[serde(rename = "byName")]
    ByName,
    #[serde(rename = "byNames")]
    ByNames,
    #[serde(rename = "byRegexp")]
    ByRegexp,
    #[serde(rename = "byType")]
    ByType,
    #[serde(rename = "numeric")]
    Numeric,
    #[serde(rename = "time")]
    Time,
    #[serde(rename = "byFrameRefID")]
    ByFrameRefId,
    #[serde(rename = "byValues")]
    ByValues,
}

impl FieldMatcherId {
    pub const ALL: [FieldMatcherId; 8] = [
        FieldMatcherId::ByName,
        FieldMatcherId::ByNames,
        FieldMatcherId::ByRegexp,
        FieldMatcherId::ByType,
        FieldMatcherId::Numeric,
        FieldMatcherId::Time,
        FieldMatcherId::ByFrameRefId,
        FieldMatcherId::ByValues,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldMatcherId::ByName => "byName",
            FieldMatcherId::ByNames => "byNames",
            FieldMatcherId::ByRegexp => "byRegexp",
            FieldMatcherId::ByType => "byType",
            FieldMatcherId::Numeric => "numeric",
            FieldMatcherId::Time => "time",
            FieldMatcherId::ByFrameRefId => "byFrameRefID",
            FieldMatcherId::ByValues => "byValues",
        }
    }
}

impl FromStr for FieldMatcherId {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldMatcherId::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| FrameError::UnknownMatcher { id: s.to_string() })
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct NamesOptions {
    names: Vec<String>,
}

#[derive(Deserialize)]
struct ByValuesOptions {
    reducer: ReducerId,
}

/// A built field predicate.
#[derive(Debug, Clone)]
pub enum FieldMatcher {
    /// Display name equals the string.
    ByName(String),
    /// Display name is one of the strings.
    ByNames(Vec<String>),
    /// Display name matches the pattern.
    ByRegexp(Regex),
    ByType(FieldType),
    Numeric,
    Time,
    /// The containing frame's refId equals the string.
    ByFrameRefId(String),
    /// The field reduces to `true` with `allIsNull` or `allIsZero`.
    ///
    /// Any other reducer never matches: only these two reduce to a boolean.
    ByValues { reducer: ReducerId },
}

impl FieldMatcher {
    /// Decode and build a matcher from its serialized form.
    pub fn from_config(config: &MatcherConfig) -> FrameResult<Self> {
        let id: FieldMatcherId = config.id.parse()?;
        let invalid = |message: String| FrameError::InvalidOptions {
            id: config.id.clone(),
            message,
        };
        let text = || {
            config
                .options
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(format!("expected a string, got {}", config.options)))
        };

        Ok(match id {
            FieldMatcherId::ByName => FieldMatcher::ByName(text()?),
            FieldMatcherId::ByNames => {
                let raw: NamesOptions = decode_options(id.as_str(), &config.options)?;
                FieldMatcher::ByNames(raw.names)
            }
            FieldMatcherId::ByRegexp => {
                let pattern = text()?;
                let re = Regex::new(&pattern).map_err(|source| FrameError::InvalidRegex { pattern, source })?;
                FieldMatcher::ByRegexp(re)
            }
            FieldMatcherId::ByType => {
                let field_type: FieldType = serde_json::from_value(config.options.clone())
                    .map_err(|e| invalid(e.to_string()))?;
                FieldMatcher::ByType(field_type)
            }
            FieldMatcherId::Numeric => FieldMatcher::Numeric,
            FieldMatcherId::Time => FieldMatcher::Time,
            FieldMatcherId::ByFrameRefId => FieldMatcher::ByFrameRefId(text()?),
            FieldMatcherId::ByValues => {
                let raw: ByValuesOptions = serde_json::from_value(config.options.clone())
                    .map_err(|e| invalid(e.to_string()))?;
                FieldMatcher::ByValues { reducer: raw.reducer }
            }
        })
    }

    /// Test `field`, which must be one of `frame`'s fields.
    ///
    /// Computes the field's display name; when testing many fields of one frame, compute
    /// [`DataFrame::display_names`] once and use [`FieldMatcher::matches_named`].
    pub fn matches(&self, field: &Field, frame: &DataFrame, all_frames: &[DataFrame]) -> bool {
        match self {
            FieldMatcher::ByName(_) | FieldMatcher::ByNames(_) | FieldMatcher::ByRegexp(_) => {
                self.matches_named(field, &frame.display_name_of(field), frame, all_frames)
            }
            _ => self.matches_named(field, "", frame, all_frames),
        }
    }

    /// Like [`FieldMatcher::matches`], with the field's display name already known.
    pub fn matches_named(
        &self,
        field: &Field,
        display_name: &str,
        frame: &DataFrame,
        _all_frames: &[DataFrame],
    ) -> bool {
        match self {
            FieldMatcher::ByName(name) => display_name == name,
            FieldMatcher::ByNames(names) => names.iter().any(|n| n == display_name),
            FieldMatcher::ByRegexp(re) => re.is_match(display_name),
            FieldMatcher::ByType(t) => field.field_type == *t,
            FieldMatcher::Numeric => field.field_type == FieldType::Number,
            FieldMatcher::Time => field.field_type == FieldType::Time,
            FieldMatcher::ByFrameRefId(ref_id) => frame.ref_id.as_deref() == Some(ref_id.as_str()),
            FieldMatcher::ByValues { reducer } => match reducer {
                ReducerId::AllIsNull | ReducerId::AllIsZero => {
                    reduce_field(field, *reducer).as_bool().unwrap_or(false)
                }
                _ => false,
            },
        }
    }
}
