//! Limit: keep the leading rows of every frame.

use serde::{Deserialize, Serialize};

use crate::types::DataFrame;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LimitOptions {
    /// Number of rows to keep.
    pub limit_field: usize,
}

impl Default for LimitOptions {
    fn default() -> Self {
        Self { limit_field: 10 }
    }
}

pub fn limit(frame: &DataFrame, options: &LimitOptions) -> DataFrame {
    if frame.length <= options.limit_field {
        return frame.clone();
    }
    let keep: Vec<usize> = (0..options.limit_field).collect();
    frame.select_rows(&keep)
}
