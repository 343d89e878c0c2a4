//! Error type shared by the loader, the binary codecs and the record view.

use thiserror::Error;

/// Result type for hypothesis model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Failures surfaced while loading, encoding or reading hypothesis data.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A required key is absent from the configuration document
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A value cannot be represented as the field's declared type
    #[error("value for `{0}` has the wrong type or is out of range")]
    TypeMismatch(&'static str),

    /// A float field is NaN or infinite
    #[error("field `{0}` must be finite")]
    NonFinite(&'static str),

    /// Hypothesis kind index outside the kind table (corrupt engine output)
    #[error("hypothesis kind index {0} is out of range")]
    IndexOutOfRange(u32),

    /// A legacy accessor that no longer returns a value
    #[error("deprecated accessor, use `{replacement}` instead")]
    DeprecatedApi { replacement: &'static str },

    /// A binary buffer is not sized in whole fixed-layout records
    #[error("expected a multiple of {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// The configuration text is not valid JSON
    #[error("malformed model document: {0}")]
    Parse(#[from] serde_json::Error),
}
