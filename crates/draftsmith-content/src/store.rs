//! Persistence interfaces for generation records and templates

use async_trait::async_trait;

use crate::{
    error::PersistenceError,
    models::{ContentType, GenerationFilter, GenerationRecord, NewGeneration, RecordUpdate},
    templates::{ContentTemplate, NewTemplate},
};

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Record store for generation attempts
///
/// Implementations must reject updates to records already in a terminal state
/// (`PersistenceError::InvalidTransition`).
#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Create a `Pending` record
    async fn create(&self, user_id: &str, new: NewGeneration)
        -> PersistenceResult<GenerationRecord>;

    /// Apply a lifecycle step and return the updated record
    async fn update(&self, id: &str, update: RecordUpdate) -> PersistenceResult<GenerationRecord>;

    async fn get(&self, id: &str) -> PersistenceResult<Option<GenerationRecord>>;

    /// A user's records, most recent first
    async fn list(
        &self,
        user_id: &str,
        filter: &GenerationFilter,
    ) -> PersistenceResult<Vec<GenerationRecord>>;
}

/// Store for prompt templates
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn create_template(
        &self,
        user_id: &str,
        new: NewTemplate,
    ) -> PersistenceResult<ContentTemplate>;

    /// The user's own templates plus, with `include_public`, every public template;
    /// most recent first
    async fn list_templates(
        &self,
        user_id: &str,
        content_type: Option<ContentType>,
        include_public: bool,
    ) -> PersistenceResult<Vec<ContentTemplate>>;
}
