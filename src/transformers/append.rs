//! Append: stack the rows of several frames into one, matching fields by name.

use crate::types::{DataFrame, Field, Value};

/// Concatenate the rows of all frames.
///
/// The first frame's fields seed the output. A field first seen in a later frame is back-filled
/// with nulls for the rows before it; fields absent from a later frame are padded with nulls for
/// that frame's rows. The output length is the sum of the input lengths. Fewer than two frames
/// are returned unchanged.
pub fn append(frames: &[DataFrame]) -> Vec<DataFrame> {
    if frames.len() < 2 {
        return frames.to_vec();
    }

    let mut fields: Vec<Field> = Vec::new();
    let mut length = 0;
    for frame in frames {
        for source in &frame.fields {
            let target = match fields.iter().position(|f| f.name == source.name) {
                Some(i) => &mut fields[i],
                None => {
                    fields.push(Field {
                        values: vec![Value::Null; length],
                        ..source.clone()
                    });
                    let last = fields.len() - 1;
                    &mut fields[last]
                }
            };
            target
                .values
                .extend((0..frame.length).map(|i| source.values.get(i).cloned().unwrap_or_default()));
        }
        length += frame.length;
        for field in fields.iter_mut() {
            field.values.resize(length, Value::Null);
        }
    }

    vec![DataFrame {
        name: None,
        ref_id: None,
        fields,
        length,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;

    fn numbers(values: &[i32]) -> Vec<Value> {
        values.iter().map(|v| Value::from(*v)).collect()
    }

    #[test]
    fn stacks_rows_and_pads_missing_fields() {
        let a = DataFrame::new(vec![
            Field::new("time", FieldType::Time, numbers(&[1, 2])),
            Field::new("cpu", FieldType::Number, numbers(&[10, 20])),
        ]);
        let b = DataFrame::new(vec![
            Field::new("time", FieldType::Time, numbers(&[3])),
            Field::new("mem", FieldType::Number, numbers(&[30])),
        ]);
        let out = append(&[a, b]);
        assert_eq!(out.len(), 1);
        let frame = &out[0];
        assert_eq!(frame.length, 3);
        frame.validate().unwrap();
        assert_eq!(frame.fields[0].values, numbers(&[1, 2, 3]));
        assert_eq!(
            frame.fields[1].values,
            vec![Value::from(10), Value::from(20), Value::Null]
        );
        assert_eq!(frame.fields[2].name(), "mem");
        assert_eq!(
            frame.fields[2].values,
            vec![Value::Null, Value::Null, Value::from(30)]
        );
    }

    #[test]
    fn single_frame_passes_through() {
        let frame = DataFrame::new(vec![Field::new("a", FieldType::Number, numbers(&[1]))]);
        assert_eq!(append(std::slice::from_ref(&frame)), vec![frame]);
    }
}
