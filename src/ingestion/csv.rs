//! CSV ingestion implementation.

use std::path::Path;

use crate::error::FrameResult;
use crate::types::{DataFrame, Field, FieldType, Value};

/// Read a CSV file into one frame.
///
/// Rules:
///
/// - CSV must have headers; each header becomes a field name.
/// - Empty cells are `null`.
/// - A column whose non-empty cells all parse as numbers is a number field (a time field when
///   its header is `time`, case-insensitively); all `true`/`false`/`yes`/`no` is a boolean
///   field; anything else is a string field.
pub fn frame_from_csv_path(path: impl AsRef<Path>) -> FrameResult<DataFrame> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    frame_from_csv_reader(&mut rdr)
}

/// Read CSV text into one frame.
pub fn frame_from_csv_str(input: &str) -> FrameResult<DataFrame> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());
    frame_from_csv_reader(&mut rdr)
}

/// Read CSV data from an existing CSV reader.
pub fn frame_from_csv_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> FrameResult<DataFrame> {
    let headers = rdr.headers()?.clone();

    let records = rdr.records().collect::<Result<Vec<_>, _>>()?;
    let mut columns: Vec<Vec<&str>> = vec![Vec::new(); headers.len()];
    for record in &records {
        for (column, raw) in columns.iter_mut().zip(record.iter()) {
            column.push(raw.trim());
        }
    }

    let fields = headers
        .iter()
        .zip(columns)
        .map(|(name, cells)| {
            let field_type = infer_column_type(name, &cells);
            let values = cells.iter().map(|raw| parse_cell(raw, field_type)).collect();
            Field::new(name, field_type, values)
        })
        .collect();

    DataFrame::try_new(fields)
}

fn infer_column_type(header: &str, cells: &[&str]) -> FieldType {
    let present: Vec<&str> = cells.iter().copied().filter(|c| !c.is_empty()).collect();
    if present.is_empty() {
        return FieldType::String;
    }
    if present.iter().all(|c| parse_number(c).is_some()) {
        return if header.eq_ignore_ascii_case("time") {
            FieldType::Time
        } else {
            FieldType::Number
        };
    }
    if present.iter().all(|c| parse_bool(c).is_some()) {
        return FieldType::Boolean;
    }
    FieldType::String
}

fn parse_cell(raw: &str, field_type: FieldType) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    match field_type {
        FieldType::Number | FieldType::Time => parse_number(raw).map_or(Value::Null, Value::Number),
        FieldType::Boolean => parse_bool(raw).map_or(Value::Null, Value::Bool),
        _ => Value::from(raw),
    }
}

fn parse_number(s: &str) -> Option<f64> {
    Value::from(s).as_numeric()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_column_types() {
        let frame = frame_from_csv_str("time,host,cpu,up\n1000,a,0.5,true\n2000,b,,no\n").unwrap();
        let types: Vec<_> = frame.fields.iter().map(|f| f.field_type).collect();
        assert_eq!(
            types,
            vec![FieldType::Time, FieldType::String, FieldType::Number, FieldType::Boolean]
        );
        assert_eq!(frame.fields[2].values, vec![Value::from(0.5), Value::Null]);
        assert_eq!(frame.fields[3].values, vec![Value::Bool(true), Value::Bool(false)]);
        assert_eq!(frame.length, 2);
    }

    #[test]
    fn mixed_columns_stay_strings() {
        let frame = frame_from_csv_str("code\n12\nN/A\n").unwrap();
        assert_eq!(frame.fields[0].field_type, FieldType::String);
        assert_eq!(frame.fields[0].values, vec![Value::from("12"), Value::from("N/A")]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(frame_from_csv_str("a,b\n1,2\n3\n").is_err());
    }
}
