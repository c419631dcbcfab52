use frame_transformers::ingestion::csv::{frame_from_csv_path, frame_from_csv_str};
use frame_transformers::transformers::{TransformContext, Transformer, TransformerConfig};
use frame_transformers::types::{FieldType, Value};
use frame_transformers::FrameError;
use serde_json::json;

#[test]
fn ingest_csv_from_path_happy_path() {
    let frame = frame_from_csv_path("tests/fixtures/servers.csv").unwrap();

    assert_eq!(frame.length, 4);
    assert_eq!(
        frame.display_names(),
        vec!["time", "server", "status", "cpu", "healthy"]
    );
    let types: Vec<_> = frame.fields.iter().map(|f| f.field_type).collect();
    assert_eq!(
        types,
        vec![
            FieldType::Time,
            FieldType::String,
            FieldType::String,
            FieldType::Number,
            FieldType::Boolean
        ]
    );
    assert_eq!(frame.fields[3].values[3], Value::Null);
    assert_eq!(frame.fields[4].values[2], Value::Bool(false));
}

#[test]
fn csv_frames_feed_transformers() {
    let frame = frame_from_csv_path("tests/fixtures/servers.csv").unwrap();
    let pivot = Transformer::from_config(&TransformerConfig::new(
        "groupingToMatrix",
        json!({ "columnField": "server", "rowField": "time", "valueField": "cpu", "emptyValue": "zero" }),
    ))
    .unwrap();
    let out = pivot.apply(&[frame], &TransformContext::default());
    assert_eq!(out[0].display_names(), vec!["time\\server", "web-1", "web-2"]);
    assert_eq!(out[0].fields[2].values, vec![Value::from(0.5), Value::from(0)]);
}

#[test]
fn ingest_csv_errors_on_ragged_rows() {
    let err = frame_from_csv_str("a,b\n1,2\n3\n").unwrap_err();
    assert!(matches!(err, FrameError::Csv(_)));
}

#[test]
fn ingest_csv_errors_on_missing_file() {
    let err = frame_from_csv_path("tests/fixtures/does_not_exist.csv").unwrap_err();
    assert!(err.to_string().starts_with("csv error"));
}
