//! Error types for content generation and record persistence

use draftsmith_ollama::InferenceError;
use thiserror::Error;

use crate::models::GenerationStatus;

/// Errors that can occur during persistence operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PersistenceError {
    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The record's lifecycle does not allow this update
    #[error("Invalid transition for generation {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: GenerationStatus,
        to: GenerationStatus,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),

    /// Backend failure not covered above
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PersistenceError {
    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceError::Io(err.to_string())
    }
}

/// Errors returned by [`crate::GenerationOrchestrator::generate_content`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    /// Rejected before any record was written or request sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The pending record could not be created
    #[error("Failed to record generation: {0}")]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Inference failed and the failed record could not be written either
    #[error("{error}; {warning}")]
    Unrecorded {
        error: InferenceError,
        warning: String,
    },
}

impl GenerationError {
    /// The inference failure behind this error, if any
    pub fn inference_error(&self) -> Option<&InferenceError> {
        match self {
            GenerationError::Inference(error) | GenerationError::Unrecorded { error, .. } => {
                Some(error)
            }
            _ => None,
        }
    }

    /// Why the failed generation is missing from the record store
    pub fn persistence_warning(&self) -> Option<&str> {
        match self {
            GenerationError::Unrecorded { warning, .. } => Some(warning),
            _ => None,
        }
    }
}

/// Template rendering errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A placeholder has neither a supplied value nor a default
    #[error("Missing template variable: {0}")]
    MissingVariable(String),

    #[error("Unclosed placeholder at byte {0}")]
    Unclosed(usize),
}
