use thiserror::Error;

/// Errors raised by the filtering, binning and aggregation engine.
///
/// An empty result is never represented here: "no record matches" is a valid
/// (empty) output of every operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The attribute name is not part of the customer schema, or the dataset
    /// was loaded from a source that did not carry that column.
    #[error("attribute '{attribute}' is not present in the dataset schema")]
    SchemaMismatch { attribute: String },

    /// A filter or bin specification is malformed, or names an attribute that
    /// cannot be used the way it was asked to be.
    #[error("invalid specification: {0}")]
    InvalidSpec(String),

    /// A record value violates the record invariants.
    #[error("invalid value for '{attribute}': {reason}")]
    InvalidValue { attribute: String, reason: String },
}

impl EngineError {
    pub(crate) fn schema_mismatch(attribute: impl Into<String>) -> Self {
        EngineError::SchemaMismatch {
            attribute: attribute.into(),
        }
    }

    pub(crate) fn invalid_spec(reason: impl Into<String>) -> Self {
        EngineError::InvalidSpec(reason.into())
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
