//! Filter-by-value: keep or drop rows whose values satisfy a set of value matchers.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::TransformContext;
use crate::matchers::{MatcherConfig, ValueMatcher};
use crate::types::DataFrame;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterByValueType {
    #[default]
    Include,
    Exclude,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterByValueMatch {
    All,
    #[default]
    Any,
}

/// One condition: a value matcher applied to the field with this display name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterByValueFilter {
    pub field_name: String,
    pub config: MatcherConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterByValueOptions {
    pub filters: Vec<FilterByValueFilter>,
    #[serde(rename = "type")]
    pub filter_type: FilterByValueType,
    #[serde(rename = "match")]
    pub match_mode: FilterByValueMatch,
}

/// Filter the rows of every frame independently.
///
/// Matcher options are interpolated with the context variables before the matchers are built.
/// Filters with an invalid matcher, or whose field a frame lacks, are skipped with a warning;
/// a frame none of the filters apply to is returned as is.
pub fn filter_by_value(
    frames: &[DataFrame],
    options: &FilterByValueOptions,
    ctx: &TransformContext,
) -> Vec<DataFrame> {
    if options.filters.is_empty() {
        return frames.to_vec();
    }

    let matchers: Vec<(&str, ValueMatcher)> = options
        .filters
        .iter()
        .filter_map(|filter| {
            let config = MatcherConfig::new(
                filter.config.id.clone(),
                ctx.interpolate_json(&filter.config.options),
            );
            match ValueMatcher::from_config(&config) {
                Ok(matcher) => Some((filter.field_name.as_str(), matcher)),
                Err(error) => {
                    warn!(field = %filter.field_name, %error, "skipping filter with invalid matcher");
                    None
                }
            }
        })
        .collect();

    frames
        .iter()
        .map(|frame| filter_frame(frame, &matchers, options))
        .collect()
}

fn filter_frame(
    frame: &DataFrame,
    matchers: &[(&str, ValueMatcher)],
    options: &FilterByValueOptions,
) -> DataFrame {
    let applicable: Vec<_> = matchers
        .iter()
        .filter_map(|(name, matcher)| match frame.field_by_display_name(name) {
            Some(field) => Some((field, matcher)),
            None => {
                warn!(field = %name, frame = ?frame.name, "filter field not found in frame, skipping");
                None
            }
        })
        .collect();
    if applicable.is_empty() {
        return frame.clone();
    }

    let rows: Vec<usize> = (0..frame.length)
        .filter(|&row| {
            let mut results = applicable.iter().map(|(field, m)| m.matches(row, field));
            let matched = match options.match_mode {
                FilterByValueMatch::All => results.all(|r| r),
                FilterByValueMatch::Any => results.any(|r| r),
            };
            match options.filter_type {
                FilterByValueType::Include => matched,
                FilterByValueType::Exclude => !matched,
            }
        })
        .collect();

    if rows.len() == frame.length {
        return frame.clone();
    }
    frame.select_rows(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, FieldType, Value};
    use serde_json::json;

    fn frame(value_name: &str, values: &[i32]) -> DataFrame {
        DataFrame::new(vec![
            Field::new(
                "time",
                FieldType::Time,
                (0..values.len() as i32).map(|t| Value::from(t * 1000)).collect(),
            ),
            Field::new(
                value_name,
                FieldType::Number,
                values.iter().map(|v| Value::from(*v)).collect(),
            ),
        ])
    }

    fn options(json: serde_json::Value) -> FilterByValueOptions {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn includes_matching_rows() {
        let opts = options(json!({
            "type": "include",
            "match": "any",
            "filters": [{ "fieldName": "A value", "config": { "id": "greater", "options": { "value": 1 } } }]
        }));
        let out = filter_by_value(&[frame("A value", &[1, 2, 3])], &opts, &TransformContext::default());
        assert_eq!(out[0].length, 2);
        assert_eq!(out[0].fields[1].values, vec![Value::from(2), Value::from(3)]);
        assert_eq!(out[0].fields[0].values, vec![Value::from(1000), Value::from(2000)]);
    }

    #[test]
    fn never_crosses_frame_boundaries() {
        let a = frame("A value", &[1, 2, 3]);
        let b = frame("B value", &[1, 2, 3]);
        let opts = options(json!({
            "type": "exclude",
            "filters": [{ "fieldName": "A value", "config": { "id": "lowerOrEqual", "options": { "value": 1 } } }]
        }));
        let out = filter_by_value(&[a, b.clone()], &opts, &TransformContext::default());
        assert_eq!(out[0].length, 2);
        assert_eq!(out[1], b);
    }

    #[test]
    fn all_versus_any() {
        let filters = json!([
            { "fieldName": "v", "config": { "id": "greater", "options": { "value": 1 } } },
            { "fieldName": "v", "config": { "id": "lower", "options": { "value": 4 } } }
        ]);
        let input = [frame("v", &[1, 2, 3, 4, 5])];
        let ctx = TransformContext::default();

        let all = filter_by_value(&input, &options(json!({ "match": "all", "filters": filters })), &ctx);
        assert_eq!(all[0].fields[1].values, vec![Value::from(2), Value::from(3)]);

        let any = filter_by_value(&input, &options(json!({ "match": "any", "filters": filters })), &ctx);
        assert_eq!(any[0].length, 5);
    }

    #[test]
    fn between_bounds_are_interpolated() {
        let opts = options(json!({
            "filters": [{
                "fieldName": "time",
                "config": { "id": "between", "options": { "from": "$__from", "to": "${__to}" } }
            }]
        }));
        let ctx = TransformContext::new()
            .with_variable("__from", "0")
            .with_variable("__to", "3000");
        let out = filter_by_value(&[frame("v", &[1, 2, 3, 4])], &opts, &ctx);
        assert_eq!(out[0].fields[0].values, vec![Value::from(1000), Value::from(2000)]);
    }

    #[test]
    fn invalid_matchers_are_skipped() {
        let opts = options(json!({
            "filters": [{ "fieldName": "v", "config": { "id": "regex", "options": { "value": "(" } } }]
        }));
        let input = vec![frame("v", &[1, 2])];
        assert_eq!(filter_by_value(&input, &opts, &TransformContext::default()), input);
    }

    #[test]
    fn excluding_everything_leaves_an_empty_frame() {
        let opts = options(json!({
            "type": "exclude",
            "filters": [{ "fieldName": "v", "config": { "id": "isNotNull", "options": {} } }]
        }));
        let out = filter_by_value(&[frame("v", &[1, 2])], &opts, &TransformContext::default());
        assert_eq!(out[0].length, 0);
        assert!(out[0].fields.iter().all(Field::is_empty));
    }
}
