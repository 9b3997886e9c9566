//! Model error types.

use thiserror::Error;

/// Result type for model conversions.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while normalizing API payloads or parsing query parameters.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{resource} record is missing required field `{field}`")]
    MissingField {
        resource: &'static str,
        field: &'static str,
    },

    #[error("Expected a JSON array of {0} records")]
    NotAnArray(&'static str),

    #[error("Malformed {resource} record: {message}")]
    Malformed {
        resource: &'static str,
        message: String,
    },

    #[error("Unknown sort field: {0}")]
    UnknownSortField(String),

    #[error("Unknown sort order: {0}")]
    UnknownSortOrder(String),
}

impl ModelError {
    pub fn missing(resource: &'static str, field: &'static str) -> Self {
        Self::MissingField { resource, field }
    }

    pub fn malformed(resource: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            resource,
            message: message.into(),
        }
    }
}
