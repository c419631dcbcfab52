//! `frame-transformers` is a library of pure transformations over tabular data frames.
//!
//! A [`types::DataFrame`] is an ordered list of equal-length, typed [`types::Field`]s. A
//! transformer takes a list of frames plus its options and returns a new list of frames; the
//! [`execution::Pipeline`] chains transformers authored as plain `{ id, disabled?, options }`
//! records.
//!
//! ## Transformers
//!
//! | id | What it does |
//! |---|---|
//! | `configFromData` | derive field config from a query's frame and apply it to other frames |
//! | `groupingToMatrix` | pivot long rows into a dense row x column matrix |
//! | `rowsToFields` | turn each row into a field, with config and labels from the row |
//! | `filterByValue` | keep or drop rows using value matchers |
//! | `order` / `organize` | reorder, exclude and rename fields by display name |
//! | `append` / `merge` | stack rows of several frames / union their fields |
//! | `formatTime` | render a time field as strings |
//! | `ignoreRow` / `limit` | drop the first or last row / keep the leading rows |
//! | `filterByRefId` | keep frames produced by selected queries |
//!
//! ## Quick example
//!
//! ```rust
//! use frame_transformers::execution::{Pipeline, PipelineOptions};
//! use frame_transformers::transformers::TransformerConfig;
//! use frame_transformers::types::{DataFrame, Field, FieldType, Value};
//!
//! let frame = DataFrame::new(vec![
//!     Field::new("Time", FieldType::Time, vec![Value::from(1000), Value::from(1001), Value::from(1002)]),
//!     Field::new("Value", FieldType::Number, vec![Value::from(1), Value::from(2), Value::from(3)]),
//! ]);
//!
//! let configs: Vec<TransformerConfig> = serde_json::from_value(serde_json::json!([
//!     { "id": "filterByValue", "options": {
//!         "type": "exclude",
//!         "filters": [{ "fieldName": "Value", "config": { "id": "greater", "options": { "value": 2 } } }]
//!     } },
//!     { "id": "groupingToMatrix", "options": {} }
//! ]))
//! .unwrap();
//!
//! let pipeline = Pipeline::new(&configs, PipelineOptions::default());
//! let out = pipeline.apply(&[frame]);
//! assert_eq!(out[0].display_names(), vec!["Time\\Time", "1000", "1001"]);
//! ```
//!
//! ## Modules
//!
//! - [`types`]: values, fields, frames and display names
//! - [`field_config`]: display config and the field-to-config mapping engine
//! - [`processing`]: reducers
//! - [`matchers`]: value and field predicates
//! - [`transformers`]: one module per transformer plus config decoding
//! - [`execution`]: pipeline runner with observer hooks and metrics
//! - [`ingestion`]: frames from JSON and CSV
//! - [`error`]: error type for configuration decoding and ingestion

pub mod error;
pub mod execution;
pub mod field_config;
pub mod ingestion;
pub mod matchers;
pub mod processing;
pub mod transformers;
pub mod types;

pub use error::{FrameError, FrameResult};
