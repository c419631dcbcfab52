//! Display configuration attached to fields.
//!
//! [`FieldConfig`] is a plain record: every property is optional so that a config derived from
//! data can be layered over an existing one with [`FieldConfig::merged_with`]. Properties this
//! crate does not model are kept in [`FieldConfig::custom`].

pub mod mapping;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use mapping::{
    config_from_reductions, evaluate_field_mappings, get_field_config_from_frame, reduce_config_frame,
    ConfigHandlerKey, FieldMappingEntry, FieldMappingResult, FieldToConfigMapping, MappingAccumulator,
};

/// Display properties of a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimals: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<FieldColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ThresholdsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mappings: Option<Vec<ValueMapping>>,
    /// Extension properties, carried through untouched.
    #[serde(flatten)]
    pub custom: serde_json::Map<String, serde_json::Value>,
}

impl FieldConfig {
    /// A copy of `self` where every property set in `overrides` replaces the current one.
    pub fn merged_with(&self, overrides: &FieldConfig) -> FieldConfig {
        let mut custom = self.custom.clone();
        custom.extend(overrides.custom.clone());
        FieldConfig {
            display_name: overrides.display_name.clone().or_else(|| self.display_name.clone()),
            unit: overrides.unit.clone().or_else(|| self.unit.clone()),
            min: overrides.min.or(self.min),
            max: overrides.max.or(self.max),
            decimals: overrides.decimals.or(self.decimals),
            no_value: overrides.no_value.clone().or_else(|| self.no_value.clone()),
            color: overrides.color.clone().or_else(|| self.color.clone()),
            thresholds: overrides.thresholds.clone().or_else(|| self.thresholds.clone()),
            mappings: overrides.mappings.clone().or_else(|| self.mappings.clone()),
            custom,
        }
    }
}

/// How a field is colored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldColorMode {
    #[serde(rename = "fixed")]
    Fixed,
    #[default]
    #[serde(rename = "thresholds")]
    Thresholds,
    #[serde(rename = "palette-classic")]
    PaletteClassic,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldColor {
    pub mode: FieldColorMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_color: Option<String>,
}

impl FieldColor {
    pub fn fixed(color: impl Into<String>) -> Self {
        Self {
            mode: FieldColorMode::Fixed,
            fixed_color: Some(color.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdsMode {
    #[default]
    Absolute,
    Percentage,
}

/// One threshold step. The base step has value `-Infinity`, written as `null` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    #[serde(
        serialize_with = "serialize_step_value",
        deserialize_with = "deserialize_step_value"
    )]
    pub value: f64,
    pub color: String,
}

fn serialize_step_value<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        serializer.serialize_none()
    }
}

fn deserialize_step_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NEG_INFINITY))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    pub mode: ThresholdsMode,
    pub steps: Vec<Threshold>,
}

impl ThresholdsConfig {
    /// Base color for values below the first explicit step.
    pub const BASE_COLOR: &'static str = "green";
    /// Color given to every step derived from data.
    pub const STEP_COLOR: &'static str = "red";

    /// Absolute thresholds with only the `-Infinity` base step.
    pub fn seeded() -> Self {
        Self {
            mode: ThresholdsMode::Absolute,
            steps: vec![Threshold {
                value: f64::NEG_INFINITY,
                color: Self::BASE_COLOR.to_string(),
            }],
        }
    }

    /// Append a step at `value` with [`Self::STEP_COLOR`].
    pub fn push_step(&mut self, value: f64) {
        self.steps.push(Threshold {
            value,
            color: Self::STEP_COLOR.to_string(),
        });
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingType {
    #[default]
    #[serde(rename = "value")]
    ValueToText,
}

/// Maps raw values (by their string form) to display text and color.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueMapping {
    #[serde(rename = "type")]
    pub mapping_type: MappingType,
    pub options: IndexMap<String, ValueMappingResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueMappingResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_overrides_and_keeps_the_rest() {
        let base = FieldConfig {
            unit: Some("ms".to_string()),
            min: Some(0.0),
            ..Default::default()
        };
        let overrides = FieldConfig {
            max: Some(100.0),
            min: Some(5.0),
            ..Default::default()
        };
        let merged = base.merged_with(&overrides);
        assert_eq!(merged.unit.as_deref(), Some("ms"));
        assert_eq!(merged.min, Some(5.0));
        assert_eq!(merged.max, Some(100.0));
    }

    #[test]
    fn base_threshold_step_serializes_as_null() {
        let mut t = ThresholdsConfig::seeded();
        t.push_step(80.0);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "mode": "absolute",
                "steps": [{"value": null, "color": "green"}, {"value": 80.0, "color": "red"}]
            })
        );
        let back: ThresholdsConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn unknown_properties_survive_a_round_trip() {
        let cfg: FieldConfig =
            serde_json::from_value(serde_json::json!({"unit": "bytes", "custom": {"width": 3}}))
                .unwrap();
        assert_eq!(cfg.unit.as_deref(), Some("bytes"));
        assert_eq!(cfg.custom["custom"]["width"], 3);
    }
}
