//! Error types for the mapping engine

use std::time::Duration;

use thiserror::Error;

use crate::validation::ValidationReport;

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Invalid schema definition for {type_name}: {reason}")]
    InvalidSchemaDefinition { type_name: String, reason: String },

    #[error("Field value can't be null: {field} ({predicate})")]
    RequiredValueMissing { field: String, predicate: String },

    #[error("Object URI value can't be null: {field}")]
    DanglingObjectReference { field: String },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("URI already exists: {0}")]
    UriAlreadyExists(String),

    #[error("Invalid field value: {0}")]
    InvalidFieldValue(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<oxigraph::model::IriParseError> for MappingError {
    fn from(err: oxigraph::model::IriParseError) -> Self {
        MappingError::InvalidUri(err.to_string())
    }
}

impl MappingError {
    pub(crate) fn schema(type_name: &str, reason: impl Into<String>) -> Self {
        MappingError::InvalidSchemaDefinition {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }

    /// Caller bugs abort the current operation and are never batched.
    pub fn is_caller_bug(&self) -> bool {
        matches!(
            self,
            MappingError::InvalidSchemaDefinition { .. }
                | MappingError::RequiredValueMissing { .. }
                | MappingError::DanglingObjectReference { .. }
                | MappingError::UnknownField(_)
                | MappingError::InvalidUri(_)
                | MappingError::InvalidFieldValue(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MappingError>;
