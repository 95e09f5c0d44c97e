//! Error types for AgentMind core operations

use crate::schema::FieldId;
use thiserror::Error;

/// Validation errors raised synchronously by settings and field edits.
///
/// A validation failure never changes state: the caller keeps whatever
/// settings or field list were in effect before the attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("JSON schema is invalid. Please fix it before saving: {reason}")]
    InvalidSchema { reason: String },

    #[error("Field name cannot be empty")]
    EmptyFieldName,

    #[error("Duplicate field name: {name}")]
    DuplicateFieldName { name: String },

    #[error("Unknown field: {id}")]
    UnknownField { id: FieldId },
}

/// Result alias for validation-checked operations.
pub type ValidationResult<T> = Result<T, ValidationError>;
