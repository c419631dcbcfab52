//! Reductions over field values.
//!
//! Reducers collapse a [`crate::types::Field`] into a single [`Reduction`]. They are consumed by
//! the `byValues` field matcher and by the field-to-config mapping engine.
//!
//! ```rust
//! use frame_transformers::processing::{reduce_field, ReducerId, Reduction};
//! use frame_transformers::types::{Field, FieldType, Value};
//!
//! let field = Field::new(
//!     "score",
//!     FieldType::Number,
//!     vec![Value::from(10.0), Value::Null, Value::from(20.0)],
//! );
//! assert_eq!(reduce_field(&field, ReducerId::Sum), Reduction::Scalar(Value::from(30.0)));
//! assert_eq!(reduce_field(&field, ReducerId::AllIsNull).as_bool(), Some(false));
//! ```

pub mod reduce;

pub use reduce::{reduce_field, reduce_values, ReducerId, Reduction};
