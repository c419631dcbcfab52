use frame_transformers::ingestion::json::{frames_from_json_path, frames_from_json_str, to_data_frame_json};
use frame_transformers::types::{FieldType, Value};
use frame_transformers::FrameError;

#[test]
fn ingest_data_frame_json_from_path_happy_path() {
    let frames = frames_from_json_path("tests/fixtures/config_and_data.json").unwrap();

    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].ref_id.as_deref(), Some("config"));
    assert_eq!(frames[0].fields[2].values, vec![Value::from(0), Value::Null]);
    assert_eq!(frames[1].length, 3);
    assert_eq!(frames[1].fields[1].labels["host"], "web-1");
    assert_eq!(frames[1].display_names()[1], "cpu {host=\"web-1\"}");
}

#[test]
fn ingest_plain_frame_form() {
    let frames = frames_from_json_path("tests/fixtures/rows.json").unwrap();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].name.as_deref(), Some("sensors"));
    assert_eq!(frames[0].fields.len(), 5);
    assert_eq!(frames[0].fields[0].field_type, FieldType::String);
}

#[test]
fn missing_type_is_inferred_from_values() {
    let input = r#"{"schema":{"fields":[{"name":"a"},{"name":"b"},{"name":"c"}]},
                   "data":{"values":[[null,"x"],[null,true],[null,null]]}}"#;
    let frames = frames_from_json_str(input).unwrap();
    let types: Vec<_> = frames[0].fields.iter().map(|f| f.field_type).collect();
    assert_eq!(types, vec![FieldType::String, FieldType::Boolean, FieldType::Other]);
}

#[test]
fn ingest_json_errors_on_ragged_plain_frames() {
    let input = r#"{"fields":[{"name":"a","values":[1,2]},{"name":"b","values":[1]}]}"#;
    let err = frames_from_json_str(input).unwrap_err();
    assert!(matches!(err, FrameError::Json(_)));
    assert!(err.to_string().contains("field 'b' has 1 values, expected 2"));
}

#[test]
fn encoded_frames_read_back_identically() {
    let frames = frames_from_json_path("tests/fixtures/config_and_data.json").unwrap();
    let encoded: Vec<_> = frames.iter().map(|f| to_data_frame_json(f).unwrap()).collect();
    let text = serde_json::to_string(&encoded).unwrap();
    assert_eq!(frames_from_json_str(&text).unwrap(), frames);
}
