//! Field ordering, exclusion and renaming by display name.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::DataFrame;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderOptions {
    pub index_by_name: IndexMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrganizeOptions {
    /// Display names to drop; only `true` entries count.
    pub exclude_by_name: IndexMap<String, bool>,
    pub index_by_name: IndexMap<String, usize>,
    /// New display names; empty strings are ignored.
    pub rename_by_name: IndexMap<String, String>,
}

/// Reorder the fields of `frame` by the index assigned to their display name.
///
/// Fields missing from `index_by_name` keep their relative order after every indexed field,
/// and are added to the map with trailing indices so a second call yields the same order.
/// Fields sharing an index keep their original relative order. Trailing indices saturate at
/// `usize::MAX`; a field added by this call still sorts after an authored field of equal index.
pub fn sort_fields_by_name(frame: &DataFrame, index_by_name: &mut IndexMap<String, usize>) -> DataFrame {
    let names = frame.display_names();
    let mut next = index_by_name.values().max().map_or(0, |max| max.saturating_add(1));
    let mut added = vec![false; names.len()];
    for (i, name) in names.iter().enumerate() {
        if !index_by_name.contains_key(name) {
            index_by_name.insert(name.clone(), next);
            next = next.saturating_add(1);
            added[i] = true;
        }
    }

    let mut order: Vec<usize> = (0..frame.fields.len()).collect();
    order.sort_by_key(|&i| (index_by_name[&names[i]], added[i]));
    let fields = order.into_iter().map(|i| frame.fields[i].clone()).collect();
    frame.with_fields(fields, frame.length)
}

/// Apply the same ordering to every frame. The map is copied per call.
pub fn order(frames: &[DataFrame], options: &OrderOptions) -> Vec<DataFrame> {
    if options.index_by_name.is_empty() {
        return frames.to_vec();
    }
    let mut index_by_name = options.index_by_name.clone();
    frames
        .iter()
        .map(|frame| sort_fields_by_name(frame, &mut index_by_name))
        .collect()
}

fn exclude_pattern(exclude_by_name: &IndexMap<String, bool>) -> Option<Regex> {
    let names: Vec<String> = exclude_by_name
        .iter()
        .filter(|(_, excluded)| **excluded)
        .map(|(name, _)| regex::escape(name))
        .collect();
    if names.is_empty() {
        return None;
    }
    let pattern = format!("^({})$", names.join("|"));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(error) => {
            warn!(%pattern, %error, "could not build exclusion pattern, nothing excluded");
            None
        }
    }
}

fn exclude_fields(frame: &DataFrame, pattern: &Regex) -> DataFrame {
    let fields = frame
        .display_names()
        .iter()
        .zip(&frame.fields)
        .filter(|(name, _)| !pattern.is_match(name))
        .map(|(_, field)| field.clone())
        .collect();
    frame.with_fields(fields, frame.length)
}

fn rename_fields(frame: &DataFrame, rename_by_name: &IndexMap<String, String>) -> DataFrame {
    let fields = frame
        .display_names()
        .iter()
        .zip(&frame.fields)
        .map(|(name, field)| {
            let mut out = field.clone();
            if let Some(rename) = rename_by_name.get(name).filter(|r| !r.is_empty()) {
                out.config.display_name = Some(rename.clone());
            }
            out
        })
        .collect();
    frame.with_fields(fields, frame.length)
}

/// Exclude, then reorder, then rename the fields of every frame.
pub fn organize(frames: &[DataFrame], options: &OrganizeOptions) -> Vec<DataFrame> {
    let pattern = exclude_pattern(&options.exclude_by_name);
    let mut index_by_name = options.index_by_name.clone();
    frames
        .iter()
        .map(|frame| {
            let mut out = match &pattern {
                Some(re) => exclude_fields(frame, re),
                None => frame.clone(),
            };
            if !index_by_name.is_empty() {
                out = sort_fields_by_name(&out, &mut index_by_name);
            }
            if !options.rename_by_name.is_empty() {
                out = rename_fields(&out, &options.rename_by_name);
            }
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, FieldType, Value};

    fn frame() -> DataFrame {
        DataFrame::new(
            ["time", "cpu", "mem", "disk"]
                .into_iter()
                .map(|n| Field::new(n, FieldType::Number, vec![Value::from(1)]))
                .collect(),
        )
    }

    fn names(frame: &DataFrame) -> Vec<String> {
        frame.display_names()
    }

    #[test]
    fn shared_index_keeps_field_order() {
        let mut index: IndexMap<String, usize> =
            [("disk".to_string(), 0), ("cpu".to_string(), 0), ("time".to_string(), 1)].into();
        let out = sort_fields_by_name(&frame(), &mut index);
        assert_eq!(names(&out), vec!["cpu", "disk", "time", "mem"]);
    }

    #[test]
    fn maximal_index_does_not_overflow() {
        let options = OrganizeOptions {
            index_by_name: [("mem".to_string(), usize::MAX)].into(),
            ..Default::default()
        };
        let out = organize(&[frame()], &options);
        assert_eq!(names(&out[0]), vec!["mem", "time", "cpu", "disk"]);
        assert_eq!(organize(&out, &options), out);
    }

    #[test]
    fn unindexed_fields_trail_in_original_order() {
        let mut index: IndexMap<String, usize> = [("mem".to_string(), 0), ("time".to_string(), 1)].into();
        let out = sort_fields_by_name(&frame(), &mut index);
        assert_eq!(names(&out), vec!["mem", "time", "cpu", "disk"]);
        assert_eq!(index["cpu"], 2);
        assert_eq!(index["disk"], 3);
    }

    #[test]
    fn sort_and_filter_is_idempotent() {
        let options = OrganizeOptions {
            exclude_by_name: [("cpu".to_string(), true), ("time".to_string(), false)].into(),
            index_by_name: [("disk".to_string(), 0), ("time".to_string(), 5)].into(),
            rename_by_name: IndexMap::new(),
        };
        let once = organize(&[frame()], &options);
        let twice = organize(&once, &options);
        assert_eq!(names(&once[0]), vec!["disk", "time", "mem"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn exclusion_matches_whole_names_only() {
        let options = OrganizeOptions {
            exclude_by_name: [("me".to_string(), true), ("disk".to_string(), true)].into(),
            ..Default::default()
        };
        let out = organize(&[frame()], &options);
        assert_eq!(names(&out[0]), vec!["time", "cpu", "mem"]);
    }

    #[test]
    fn rename_sets_display_name() {
        let options = OrganizeOptions {
            rename_by_name: [("cpu".to_string(), "CPU %".to_string()), ("mem".to_string(), String::new())].into(),
            ..Default::default()
        };
        let out = organize(&[frame()], &options);
        assert_eq!(out[0].fields[1].config.display_name.as_deref(), Some("CPU %"));
        assert_eq!(out[0].fields[2].config.display_name, None);
        assert_eq!(out[0].fields[1].name(), "cpu");
    }

    #[test]
    fn order_leaves_options_untouched() {
        let options = OrderOptions {
            index_by_name: [("disk".to_string(), 0)].into(),
        };
        let out = order(&[frame(), frame()], &options);
        assert_eq!(names(&out[1]), vec!["disk", "time", "cpu", "mem"]);
        assert_eq!(options.index_by_name.len(), 1);
    }
}
