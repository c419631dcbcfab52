use thiserror::Error;

/// Convenience result type for configuration decoding and ingestion.
pub type FrameResult<T> = Result<T, FrameError>;

/// Error type returned by configuration decoding and frame ingestion.
///
/// Applying a transformer never returns this type: data-shape problems are absorbed by the
/// transformer itself (pass-through, `false` predicate, skipped filter). Errors only surface
/// where a caller hands the crate something it cannot interpret.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON could not be parsed or did not decode into the expected record.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV ingestion error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A transformer or matcher was configured with options it cannot use.
    #[error("invalid options for '{id}': {message}")]
    InvalidOptions { id: String, message: String },

    /// No transformer is registered under this id.
    #[error("unknown transformer '{id}'")]
    UnknownTransformer { id: String },

    /// No value or field matcher is registered under this id.
    #[error("unknown matcher '{id}'")]
    UnknownMatcher { id: String },

    /// A pattern option failed to compile.
    #[error("invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A field's value count differs from the frame length.
    #[error("field '{field}' has {actual} values, expected {expected}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// The input does not have the shape of a data frame.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },
}
