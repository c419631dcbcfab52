//! Rows-to-fields: turn every row of a frame into its own single-value field.

use serde::{Deserialize, Serialize};

use crate::field_config::{
    evaluate_field_mappings, get_field_config_from_frame, ConfigHandlerKey, FieldToConfigMapping,
};
use crate::types::{DataFrame, Field};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RowsToFieldsOptions {
    pub mappings: Vec<FieldToConfigMapping>,
}

/// One output field per input row, in a frame of length 1.
///
/// The name and value sources are resolved in name-and-value mode. Fields resolved to
/// `field.label` become labels of every output field, keyed by their display name. A frame
/// without a resolvable name or value field is returned unchanged.
pub fn rows_to_fields(frame: &DataFrame, options: &RowsToFieldsOptions) -> DataFrame {
    let result = evaluate_field_mappings(frame, &options.mappings, true);
    let (Some(name_index), Some(value_index)) = (result.name_field, result.value_field) else {
        return frame.clone();
    };
    let name_field = &frame.fields[name_index];
    let value_field = &frame.fields[value_index];

    let label_fields: Vec<(&str, &Field)> = result
        .entries
        .iter()
        .zip(&frame.fields)
        .enumerate()
        .filter(|(i, (entry, _))| {
            *i != name_index
                && *i != value_index
                && entry.handler == Some(ConfigHandlerKey::FieldLabel)
        })
        .map(|(_, (entry, field))| (entry.display_name.as_str(), field))
        .collect();

    let fields = (0..frame.length)
        .map(|row| {
            let mut labels = name_field.labels.clone();
            for (key, field) in &label_fields {
                let value = field.values.get(row).cloned().unwrap_or_default();
                labels.insert((*key).to_string(), value.to_string());
            }
            Field {
                name: Some(name_field.values.get(row).cloned().unwrap_or_default().to_string()),
                field_type: value_field.field_type,
                values: vec![value_field.values.get(row).cloned().unwrap_or_default()],
                config: get_field_config_from_frame(frame, row, &result),
                labels,
            }
        })
        .collect();

    frame.with_fields(fields, 1)
}
