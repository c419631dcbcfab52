//! Filter-by-refId: keep only the frames produced by selected queries.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::DataFrame;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterByRefIdOptions {
    /// A refId, or a `/pattern/` matched against refIds. Empty keeps everything.
    pub include: String,
}

enum RefIdMatcher {
    Exact(String),
    Pattern(Regex),
}

impl RefIdMatcher {
    fn new(include: &str) -> Option<Self> {
        let pattern = include
            .strip_prefix('/')
            .and_then(|p| p.strip_suffix('/'))
            .filter(|p| !p.is_empty());
        match pattern {
            Some(p) => match Regex::new(p) {
                Ok(re) => Some(RefIdMatcher::Pattern(re)),
                Err(error) => {
                    warn!(pattern = p, %error, "invalid refId pattern, nothing filtered");
                    None
                }
            },
            None => Some(RefIdMatcher::Exact(include.to_string())),
        }
    }

    fn matches(&self, ref_id: &str) -> bool {
        match self {
            RefIdMatcher::Exact(id) => id == ref_id,
            RefIdMatcher::Pattern(re) => re.is_match(ref_id),
        }
    }
}

pub fn filter_by_ref_id(frames: &[DataFrame], options: &FilterByRefIdOptions) -> Vec<DataFrame> {
    if options.include.is_empty() {
        return frames.to_vec();
    }
    let Some(matcher) = RefIdMatcher::new(&options.include) else {
        return frames.to_vec();
    };
    frames
        .iter()
        .filter(|f| matcher.matches(f.ref_id.as_deref().unwrap_or("")))
        .cloned()
        .collect()
}
