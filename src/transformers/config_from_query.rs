//! Config-from-query: derive field config from one query's frame and apply it to the others.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::field_config::{
    config_from_reductions, evaluate_field_mappings, reduce_config_frame, FieldToConfigMapping,
};
use crate::matchers::{FieldMatcher, MatcherConfig};
use crate::types::DataFrame;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigFromQueryOptions {
    /// refId of the frame holding the config.
    pub config_ref_id: String,
    pub mappings: Vec<FieldToConfigMapping>,
    /// Fields that receive the config. Numeric fields when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_to: Option<MatcherConfig>,
}

impl Default for ConfigFromQueryOptions {
    fn default() -> Self {
        Self {
            config_ref_id: "config".to_string(),
            mappings: Vec::new(),
            apply_to: None,
        }
    }
}

fn target_matcher(options: &ConfigFromQueryOptions) -> FieldMatcher {
    let Some(config) = &options.apply_to else {
        return FieldMatcher::Numeric;
    };
    FieldMatcher::from_config(config).unwrap_or_else(|error| {
        warn!(matcher = %config.id, %error, "invalid applyTo matcher, using numeric fields");
        FieldMatcher::Numeric
    })
}

/// Reduce the config frame and merge the result into every matching field.
///
/// With several frames, the config frame itself is left out of the output. With a single
/// frame the config is applied back onto that frame. No frame with `configRefId` means the
/// input is returned unchanged.
pub fn config_from_query(frames: &[DataFrame], options: &ConfigFromQueryOptions) -> Vec<DataFrame> {
    let Some(config_index) = frames
        .iter()
        .position(|f| f.ref_id.as_deref() == Some(options.config_ref_id.as_str()))
    else {
        return frames.to_vec();
    };
    let config_frame = &frames[config_index];

    let result = evaluate_field_mappings(config_frame, &options.mappings, false);
    let reductions = reduce_config_frame(config_frame, &result);
    let config = config_from_reductions(&reductions, &result);
    let matcher = target_matcher(options);

    frames
        .iter()
        .enumerate()
        .filter(|(i, _)| frames.len() == 1 || *i != config_index)
        .map(|(_, frame)| {
            let names = frame.display_names();
            let fields = frame
                .fields
                .iter()
                .zip(&names)
                .map(|(field, name)| {
                    let mut out = field.clone();
                    if matcher.matches_named(field, name, frame, frames) {
                        out.config = field.config.merged_with(&config);
                    }
                    out
                })
                .collect();
            frame.with_fields(fields, frame.length)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, FieldType, Value};
    use serde_json::json;

    fn config_frame() -> DataFrame {
        DataFrame::new(vec![
            Field::new("Time", FieldType::Time, vec![Value::from(1000)]),
            Field::new("Max", FieldType::Number, vec![Value::from(50)]),
            Field::new("Unit", FieldType::String, vec![Value::from("ms")]),
        ])
        .with_ref_id("config")
    }

    fn data_frame() -> DataFrame {
        DataFrame::new(vec![
            Field::new("Time", FieldType::Time, vec![Value::from(1000), Value::from(2000)]),
            Field::new("Latency", FieldType::Number, vec![Value::from(10), Value::from(70)]),
            Field::new("Host", FieldType::String, vec![Value::from("a"), Value::from("b")]),
        ])
        .with_ref_id("A")
    }

    #[test]
    fn config_frame_is_consumed_when_there_are_others() {
        let out = config_from_query(&[config_frame(), data_frame()], &ConfigFromQueryOptions::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].ref_id.as_deref(), Some("A"));
        let latency = &out[0].fields[1];
        assert_eq!(latency.config.max, Some(50.0));
        assert_eq!(latency.config.unit.as_deref(), Some("ms"));
        // Only numeric fields receive config by default.
        assert_eq!(out[0].fields[0].config, Default::default());
        assert_eq!(out[0].fields[2].config, Default::default());
    }

    #[test]
    fn single_frame_gets_its_own_config() {
        let out = config_from_query(&[config_frame()], &ConfigFromQueryOptions::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].fields[1].config.max, Some(50.0));
    }

    #[test]
    fn apply_to_selects_target_fields() {
        let options = ConfigFromQueryOptions {
            apply_to: Some(MatcherConfig::new("byName", json!("Host"))),
            ..Default::default()
        };
        let out = config_from_query(&[config_frame(), data_frame()], &options);
        assert_eq!(out[0].fields[2].config.unit.as_deref(), Some("ms"));
        assert_eq!(out[0].fields[1].config.unit, None);
    }

    #[test]
    fn missing_config_frame_passes_through() {
        let input = vec![data_frame()];
        assert_eq!(config_from_query(&input, &ConfigFromQueryOptions::default()), input);
    }

    #[test]
    fn existing_config_is_kept_where_not_overridden() {
        let mut frame = data_frame();
        frame.fields[1].config.decimals = Some(2.0);
        let out = config_from_query(&[config_frame(), frame], &ConfigFromQueryOptions::default());
        assert_eq!(out[0].fields[1].config.decimals, Some(2.0));
        assert_eq!(out[0].fields[1].config.max, Some(50.0));
    }
}
