//! JSON ingestion implementation.
//!
//! Supported inputs (a single object or an array of them):
//! - Data-frame JSON: `{"schema": {"name", "refId", "fields": [{"name", "type", "config", "labels"}]},
//!   "data": {"values": [[...], ...]}}` with one value array per field
//! - The plain frame form produced by serializing [`DataFrame`]:
//!   `{"name", "refId", "fields": [{"name", "type", "values", "config", "labels"}]}`

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{FrameError, FrameResult};
use crate::field_config::FieldConfig;
use crate::types::{DataFrame, Field, FieldType, Labels, Value};

#[derive(Deserialize)]
struct FrameJson {
    schema: SchemaJson,
    #[serde(default)]
    data: Option<DataJson>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaJson {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    ref_id: Option<String>,
    #[serde(default)]
    fields: Vec<SchemaFieldJson>,
}

#[derive(Deserialize)]
struct SchemaFieldJson {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    field_type: Option<FieldType>,
    #[serde(default)]
    config: FieldConfig,
    #[serde(default)]
    labels: Labels,
}

#[derive(Deserialize)]
struct DataJson {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Read frames from a JSON file.
pub fn frames_from_json_path(path: impl AsRef<Path>) -> FrameResult<Vec<DataFrame>> {
    let text = fs::read_to_string(path)?;
    frames_from_json_str(&text)
}

/// Read frames from an in-memory JSON string.
pub fn frames_from_json_str(input: &str) -> FrameResult<Vec<DataFrame>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FrameError::SchemaMismatch {
            message: "json input is empty".to_string(),
        });
    }

    match serde_json::from_str::<serde_json::Value>(trimmed)? {
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                frame_from_json_value(item).map_err(|e| match e {
                    FrameError::SchemaMismatch { message } => FrameError::SchemaMismatch {
                        message: format!("frame {i}: {message}"),
                    },
                    other => other,
                })
            })
            .collect(),
        v @ serde_json::Value::Object(_) => Ok(vec![frame_from_json_value(v)?]),
        _ => Err(FrameError::SchemaMismatch {
            message: "json must be a frame object or an array of frames".to_string(),
        }),
    }
}

/// Decode one frame in either supported form.
pub fn frame_from_json_value(value: serde_json::Value) -> FrameResult<DataFrame> {
    let is_frame_json = value.get("schema").is_some();
    if !is_frame_json {
        return Ok(serde_json::from_value(value)?);
    }

    let raw: FrameJson = serde_json::from_value(value)?;
    let mut columns = raw.data.map(|d| d.values).unwrap_or_default();
    if columns.is_empty() {
        columns = vec![Vec::new(); raw.schema.fields.len()];
    }
    if columns.len() != raw.schema.fields.len() {
        return Err(FrameError::SchemaMismatch {
            message: format!(
                "schema has {} fields but data has {} value arrays",
                raw.schema.fields.len(),
                columns.len()
            ),
        });
    }

    let fields = raw
        .schema
        .fields
        .into_iter()
        .zip(columns)
        .map(|(schema, values)| Field {
            name: schema.name,
            field_type: schema.field_type.unwrap_or_else(|| FieldType::infer(&values)),
            values,
            config: schema.config,
            labels: schema.labels,
        })
        .collect();

    let mut frame = DataFrame::try_new(fields)?;
    frame.name = raw.schema.name;
    frame.ref_id = raw.schema.ref_id;
    Ok(frame)
}

/// Encode a frame as data-frame JSON.
pub fn to_data_frame_json(frame: &DataFrame) -> FrameResult<serde_json::Value> {
    let mut schema = serde_json::Map::new();
    if let Some(name) = &frame.name {
        schema.insert("name".to_string(), name.clone().into());
    }
    if let Some(ref_id) = &frame.ref_id {
        schema.insert("refId".to_string(), ref_id.clone().into());
    }
    let fields = frame
        .fields
        .iter()
        .map(|f| -> FrameResult<serde_json::Value> {
            let mut out = serde_json::Map::new();
            out.insert("name".to_string(), f.name.clone().into());
            out.insert("type".to_string(), serde_json::to_value(f.field_type)?);
            out.insert("config".to_string(), serde_json::to_value(&f.config)?);
            if !f.labels.is_empty() {
                out.insert("labels".to_string(), serde_json::to_value(&f.labels)?);
            }
            Ok(serde_json::Value::Object(out))
        })
        .collect::<FrameResult<Vec<_>>>()?;
    schema.insert("fields".to_string(), serde_json::Value::Array(fields));

    let values: Vec<serde_json::Value> = frame
        .fields
        .iter()
        .map(|f| serde_json::Value::Array(f.values.iter().map(serde_json::Value::from).collect()))
        .collect();

    Ok(serde_json::json!({
        "schema": schema,
        "data": { "values": values },
    }))
}
