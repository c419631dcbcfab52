//! Grouping-to-matrix: pivot long-format rows into a dense row x column matrix.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::field_config::FieldConfig;
use crate::types::{DataFrame, Field, Value, ValueKey};

/// Placeholder written into matrix cells that have no value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialValue {
    /// Empty string.
    #[default]
    Empty,
    Null,
    False,
    True,
    Zero,
}

impl SpecialValue {
    pub fn value(&self) -> Value {
        match self {
            SpecialValue::Empty => Value::from(""),
            SpecialValue::Null => Value::Null,
            SpecialValue::False => Value::Bool(false),
            SpecialValue::True => Value::Bool(true),
            SpecialValue::Zero => Value::Number(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupingToMatrixOptions {
    pub column_field: String,
    pub row_field: String,
    pub value_field: String,
    pub empty_value: SpecialValue,
}

impl Default for GroupingToMatrixOptions {
    fn default() -> Self {
        Self {
            column_field: "Time".to_string(),
            row_field: "Time".to_string(),
            value_field: "Value".to_string(),
            empty_value: SpecialValue::Empty,
        }
    }
}

/// The pivot needs three fields to be useful, counted over all frames.
pub fn is_applicable(frames: &[DataFrame]) -> bool {
    frames.iter().map(|f| f.fields.len()).sum::<usize>() >= 3
}

/// Pivot the single input frame.
///
/// Column and row keys keep first-seen order. When several rows land on the same
/// `(column, row)` cell the last one wins. Anything other than exactly one frame, or a frame
/// lacking one of the three named fields, is passed through unchanged.
pub fn grouping_to_matrix(frames: &[DataFrame], options: &GroupingToMatrixOptions) -> Vec<DataFrame> {
    let [frame] = frames else {
        return frames.to_vec();
    };
    let (Some(column), Some(row), Some(value)) = (
        frame.field_by_display_name(&options.column_field),
        frame.field_by_display_name(&options.row_field),
        frame.field_by_display_name(&options.value_field),
    ) else {
        return frames.to_vec();
    };

    let mut columns: IndexMap<ValueKey, Value> = IndexMap::new();
    let mut rows: IndexMap<ValueKey, Value> = IndexMap::new();
    let mut cells: IndexMap<(ValueKey, ValueKey), Value> = IndexMap::new();

    for index in 0..frame.length {
        let column_value = column.values.get(index).cloned().unwrap_or_default();
        let row_value = row.values.get(index).cloned().unwrap_or_default();
        let column_key = column_value.key();
        let row_key = row_value.key();
        columns.entry(column_key.clone()).or_insert(column_value);
        rows.entry(row_key.clone()).or_insert(row_value);
        cells.insert(
            (column_key, row_key),
            value.values.get(index).cloned().unwrap_or_default(),
        );
    }

    let empty = options.empty_value.value();
    let mut fields = Vec::with_capacity(columns.len() + 1);
    fields.push(Field {
        name: Some(format!("{}\\{}", options.row_field, options.column_field)),
        field_type: row.field_type,
        values: rows.values().cloned().collect(),
        config: FieldConfig::default(),
        labels: Default::default(),
    });

    for (column_key, column_value) in &columns {
        let values = rows
            .keys()
            .map(|row_key| {
                cells
                    .get(&(column_key.clone(), row_key.clone()))
                    .filter(|v| !v.is_nullish())
                    .cloned()
                    .unwrap_or_else(|| empty.clone())
            })
            .collect();
        fields.push(Field {
            name: (!column_value.is_nullish()).then(|| column_value.to_string()),
            field_type: value.field_type,
            values,
            config: value.config.clone(),
            labels: Default::default(),
        });
    }

    vec![DataFrame {
        name: None,
        ref_id: None,
        fields,
        length: rows.len(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;

    fn long_frame() -> DataFrame {
        DataFrame::new(vec![
            Field::new(
                "Time",
                FieldType::Time,
                vec![Value::from(1000), Value::from(1001), Value::from(1002)],
            ),
            Field::new(
                "Value",
                FieldType::Number,
                vec![Value::from(1), Value::from(2), Value::from(3)],
            ),
        ])
    }

    #[test]
    fn pivots_time_against_time_by_default() {
        let out = grouping_to_matrix(&[long_frame()], &GroupingToMatrixOptions::default());
        assert_eq!(out.len(), 1);
        let frame = &out[0];
        assert_eq!(frame.length, 3);
        let names: Vec<_> = frame.fields.iter().map(Field::name).collect();
        assert_eq!(names, vec!["Time\\Time", "1000", "1001", "1002"]);
        assert_eq!(frame.fields[0].field_type, FieldType::Time);
        assert_eq!(
            frame.fields[0].values,
            vec![Value::from(1000), Value::from(1001), Value::from(1002)]
        );
        assert_eq!(frame.fields[1].values, vec![Value::from(1), Value::from(""), Value::from("")]);
        assert_eq!(frame.fields[2].values, vec![Value::from(""), Value::from(2), Value::from("")]);
        assert_eq!(frame.fields[3].values, vec![Value::from(""), Value::from(""), Value::from(3)]);
        frame.validate().unwrap();
    }

    fn server_frame() -> DataFrame {
        DataFrame::new(vec![
            Field::new(
                "Server",
                FieldType::String,
                vec![Value::from("b"), Value::from("a"), Value::from("b"), Value::Null],
            ),
            Field::new(
                "Metric",
                FieldType::String,
                vec![Value::from("cpu"), Value::from("cpu"), Value::from("cpu"), Value::from("mem")],
            ),
            Field::new(
                "Value",
                FieldType::Number,
                vec![Value::from(1), Value::from(2), Value::from(3), Value::from(4)],
            ),
        ])
    }

    #[test]
    fn keeps_first_seen_order_and_last_write_wins() {
        let options = GroupingToMatrixOptions {
            column_field: "Server".to_string(),
            row_field: "Metric".to_string(),
            value_field: "Value".to_string(),
            empty_value: SpecialValue::Zero,
        };
        let out = grouping_to_matrix(&[server_frame()], &options);
        let frame = &out[0];
        assert_eq!(frame.fields[0].name(), "Metric\\Server");
        assert_eq!(frame.fields[0].values, vec![Value::from("cpu"), Value::from("mem")]);
        // b came first; its duplicate (b, cpu) cell keeps the later value 3.
        assert_eq!(frame.fields[1].name.as_deref(), Some("b"));
        assert_eq!(frame.fields[1].values, vec![Value::from(3), Value::from(0)]);
        assert_eq!(frame.fields[2].name.as_deref(), Some("a"));
        assert_eq!(frame.fields[2].values, vec![Value::from(2), Value::from(0)]);
        // A null column key becomes an unnamed field, not "null".
        assert_eq!(frame.fields[3].name, None);
        assert_eq!(frame.fields[3].values, vec![Value::from(0), Value::from(4)]);
    }

    #[test]
    fn special_values() {
        assert_eq!(SpecialValue::Null.value(), Value::Null);
        assert_eq!(SpecialValue::True.value(), Value::Bool(true));
        assert_eq!(SpecialValue::False.value(), Value::Bool(false));
    }

    #[test]
    fn passes_through_when_fields_are_missing_or_frames_are_many() {
        let options = GroupingToMatrixOptions {
            column_field: "Nope".to_string(),
            ..Default::default()
        };
        let input = vec![long_frame()];
        assert_eq!(grouping_to_matrix(&input, &options), input);

        let two = vec![long_frame(), long_frame()];
        assert_eq!(grouping_to_matrix(&two, &GroupingToMatrixOptions::default()), two);
    }

    #[test]
    fn applicability_counts_fields() {
        assert!(!is_applicable(&[long_frame()]));
        assert!(is_applicable(&[server_frame()]));
    }
}
