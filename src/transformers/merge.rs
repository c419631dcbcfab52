//! Merge: union the fields of several frames into one frame.

use indexmap::IndexMap;

use crate::types::{DataFrame, Field, Value};

/// Collect every distinctly named field into one frame.
///
/// When several frames carry a field with the same name, the first one is kept and the later
/// ones are dropped. Fields shorter than the longest field are padded with nulls. Fewer than two
/// frames are returned unchanged.
pub fn merge(frames: &[DataFrame]) -> Vec<DataFrame> {
    if frames.len() < 2 {
        return frames.to_vec();
    }

    let mut by_name: IndexMap<&str, &Field> = IndexMap::new();
    for field in frames.iter().flat_map(|f| &f.fields) {
        by_name.entry(field.name()).or_insert(field);
    }
    let length = by_name.values().map(|f| f.len()).max().unwrap_or(0);
    let fields = by_name
        .into_values()
        .map(|field| {
            let mut out = field.clone();
            out.values.resize(length, Value::Null);
            out
        })
        .collect();

    vec![DataFrame {
        name: None,
        ref_id: None,
        fields,
        length,
    }]
}
