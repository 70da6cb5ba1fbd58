//! In-memory generation record store

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::PersistenceError,
    models::{GenerationFilter, GenerationRecord, NewGeneration, RecordUpdate},
    store::{GenerationStore, PersistenceResult},
};

/// Thread-safe in-memory implementation of GenerationStore
///
/// Uses RwLock for concurrent read access with exclusive write access.
/// Returns clones so callers never hold references into the map.
#[derive(Debug, Default)]
pub struct InMemoryGenerationStore {
    records: RwLock<HashMap<String, GenerationRecord>>,
}

impl InMemoryGenerationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with initial records (useful for testing)
    pub fn with_records(records: Vec<GenerationRecord>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().map(|r| (r.id.clone(), r)).collect()),
        }
    }

    pub fn count(&self) -> usize {
        self.records.read().len()
    }

    /// Copy of every record, in no particular order
    pub fn snapshot(&self) -> Vec<GenerationRecord> {
        self.records.read().values().cloned().collect()
    }

    /// A fresh pending record; not stored until [`Self::put`]
    pub(crate) fn new_record(user_id: &str, new: NewGeneration) -> GenerationRecord {
        GenerationRecord::pending(Uuid::new_v4().to_string(), user_id, new, Utc::now())
    }

    /// The record as `update` would leave it, without storing the change
    pub(crate) fn preview_update(
        &self,
        id: &str,
        update: RecordUpdate,
    ) -> PersistenceResult<GenerationRecord> {
        let mut record = self
            .records
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| PersistenceError::not_found("generation", id))?;
        record.apply(update, Utc::now())?;
        Ok(record)
    }

    /// Insert or replace a record by id
    pub(crate) fn put(&self, record: GenerationRecord) {
        self.records.write().insert(record.id.clone(), record);
    }

    pub(crate) fn insert_new(&self, user_id: &str, new: NewGeneration) -> GenerationRecord {
        let record = Self::new_record(user_id, new);
        debug!("Created generation record {}", record.id);
        self.put(record.clone());
        record
    }

    pub(crate) fn apply_update(
        &self,
        id: &str,
        update: RecordUpdate,
    ) -> PersistenceResult<GenerationRecord> {
        let mut records = self.records.write();
        let record = records
            .get_mut(id)
            .ok_or_else(|| PersistenceError::not_found("generation", id))?;
        record.apply(update, Utc::now())?;
        debug!("Generation record {} is now {}", id, record.status);
        Ok(record.clone())
    }
}

#[async_trait]
impl GenerationStore for InMemoryGenerationStore {
    async fn create(
        &self,
        user_id: &str,
        new: NewGeneration,
    ) -> PersistenceResult<GenerationRecord> {
        Ok(self.insert_new(user_id, new))
    }

    async fn update(&self, id: &str, update: RecordUpdate) -> PersistenceResult<GenerationRecord> {
        self.apply_update(id, update)
    }

    async fn get(&self, id: &str) -> PersistenceResult<Option<GenerationRecord>> {
        Ok(self.records.read().get(id).cloned())
    }

    async fn list(
        &self,
        user_id: &str,
        filter: &GenerationFilter,
    ) -> PersistenceResult<Vec<GenerationRecord>> {
        let records = self.records.read();
        Ok(filter.apply(records.values().filter(|r| r.user_id == user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentType, GenerationStatus};

    fn new_generation(content_type: ContentType) -> NewGeneration {
        NewGeneration {
            model: "llama2".to_string(),
            content_type,
            prompt: "Write something".to_string(),
            metadata: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryGenerationStore::new();
        let record = store
            .create("u1", new_generation(ContentType::Blog))
            .await
            .unwrap();

        assert_eq!(record.status, GenerationStatus::Pending);
        assert_eq!(record.prompt_length, 15);
        let found = store.get(&record.id).await.unwrap();
        assert_eq!(found, Some(record));
    }

    #[tokio::test]
    async fn test_update_unknown_record() {
        let store = InMemoryGenerationStore::new();
        let err = store
            .update("missing", RecordUpdate::Generating)
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_terminal_record_rejects_updates() {
        let store = InMemoryGenerationStore::new();
        let record = store
            .create("u1", new_generation(ContentType::General))
            .await
            .unwrap();
        store
            .update(
                &record.id,
                RecordUpdate::Failed {
                    error_message: "boom".to_string(),
                    generation_time_ms: 3,
                    partial_content: None,
                },
            )
            .await
            .unwrap();

        let err = store
            .update(
                &record.id,
                RecordUpdate::Completed {
                    content: "late".to_string(),
                    generation_time_ms: 5,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidTransition { .. }));

        let stored = store.get(&record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, GenerationStatus::Failed);
        assert!(stored.generated_content.is_none());
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_user() {
        let store = InMemoryGenerationStore::new();
        store.create("u1", new_generation(ContentType::Blog)).await.unwrap();
        store.create("u1", new_generation(ContentType::Social)).await.unwrap();
        store.create("u2", new_generation(ContentType::Blog)).await.unwrap();

        let all = store.list("u1", &GenerationFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let blogs = store
            .list(
                "u1",
                &GenerationFilter {
                    content_type: Some(ContentType::Blog),
                    ..GenerationFilter::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(blogs.len(), 1);
        assert_eq!(store.count(), 3);
    }
}
