//! Ignore-row: drop the first or last row of every frame.

use serde::{Deserialize, Serialize};

use crate::types::DataFrame;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPosition {
    First,
    #[default]
    Last,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreRowOptions {
    pub position: RowPosition,
}

/// Drop one row. A frame with one row or none comes back with length 0 and the same fields.
pub fn ignore_row(frame: &DataFrame, options: &IgnoreRowOptions) -> DataFrame {
    let keep: Vec<usize> = match options.position {
        RowPosition::First => (1..frame.length).collect(),
        RowPosition::Last => (0..frame.length.saturating_sub(1)).collect(),
    };
    frame.select_rows(&keep)
}
