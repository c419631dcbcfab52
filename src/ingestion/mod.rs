//! Frame ingestion.
//!
//! Transformers do not care where frames come from; these readers exist so pipelines can be
//! fed from files and fixtures:
//! - [`json`]: data-frame JSON and the plain serialized [`crate::types::DataFrame`] form
//! - [`csv`]: one frame per CSV document, with per-column type inference
//!
//! Every reader checks the equal-length invariant before returning a frame.

pub mod csv;
pub mod json;

pub use self::csv::{frame_from_csv_path, frame_from_csv_reader, frame_from_csv_str};
pub use self::json::{frame_from_json_value, frames_from_json_path, frames_from_json_str, to_data_frame_json};
