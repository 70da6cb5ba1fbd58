//! Generation records persisted to a JSON file

use std::{
    fs,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::{
    memory::InMemoryGenerationStore,
    models::{GenerationFilter, GenerationRecord, NewGeneration, RecordUpdate},
    store::{GenerationStore, PersistenceResult},
};

/// Generation store backed by a single pretty-printed JSON file
///
/// The file is read once at open and rewritten on every create or update; a change
/// reaches memory only after the rewrite succeeds.
#[derive(Debug)]
pub struct JsonFileGenerationStore {
    path: PathBuf,
    inner: InMemoryGenerationStore,
    write_lock: Mutex<()>,
}

impl JsonFileGenerationStore {
    /// Open the store at `path`, creating parent directories; a missing file is an
    /// empty store
    pub fn open(path: impl Into<PathBuf>) -> PersistenceResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let records: Vec<GenerationRecord> = if path.exists() {
            let json = fs::read_to_string(&path)?;
            if json.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&json)?
            }
        } else {
            Vec::new()
        };

        info!("Loaded {} generation records from {:?}", records.len(), path);
        Ok(Self {
            path,
            inner: InMemoryGenerationStore::with_records(records),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every record with `changed` in place of its stored version
    ///
    /// Callers hold `write_lock` and commit `changed` to memory only once this succeeds,
    /// so a failed write leaves both the file and memory as they were.
    fn save_with(&self, changed: &GenerationRecord) -> PersistenceResult<()> {
        let mut records = self.inner.snapshot();
        match records.iter_mut().find(|r| r.id == changed.id) {
            Some(slot) => *slot = changed.clone(),
            None => records.push(changed.clone()),
        }
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        let json = serde_json::to_string_pretty(&records)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Saved {} generation records to {:?}", records.len(), self.path);
        Ok(())
    }
}

#[async_trait]
impl GenerationStore for JsonFileGenerationStore {
    async fn create(
        &self,
        user_id: &str,
        new: NewGeneration,
    ) -> PersistenceResult<GenerationRecord> {
        let _guard = self.write_lock.lock();
        let record = InMemoryGenerationStore::new_record(user_id, new);
        self.save_with(&record)?;
        debug!("Created generation record {}", record.id);
        self.inner.put(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, update: RecordUpdate) -> PersistenceResult<GenerationRecord> {
        let _guard = self.write_lock.lock();
        let record = self.inner.preview_update(id, update)?;
        self.save_with(&record)?;
        debug!("Generation record {} is now {}", id, record.status);
        self.inner.put(record.clone());
        Ok(record)
    }

    async fn get(&self, id: &str) -> PersistenceResult<Option<GenerationRecord>> {
        self.inner.get(id).await
    }

    async fn list(
        &self,
        user_id: &str,
        filter: &GenerationFilter,
    ) -> PersistenceResult<Vec<GenerationRecord>> {
        self.inner.list(user_id, filter).await
    }
}
