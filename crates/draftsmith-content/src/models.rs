//! Generation records, requests and outcomes

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use draftsmith_ollama::{CancellationToken, ModelAttempt, SamplingParams};
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;

/// Kind of content being produced
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Blog,
    Social,
    Product,
    #[default]
    General,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [
        ContentType::Blog,
        ContentType::Social,
        ContentType::Product,
        ContentType::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Blog => "blog",
            ContentType::Social => "social",
            ContentType::Product => "product",
            ContentType::General => "general",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown content type '{}' (expected blog, social, product or general)",
                    s
                )
            })
    }
}

/// Lifecycle state of a generation record
///
/// `Pending -> Generating -> Completed | Failed`. A record may also go straight from
/// `Pending` to a terminal state when the `Generating` update could not be stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Pending,
    Generating,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationStatus::Completed | GenerationStatus::Failed)
    }

    pub fn can_transition_to(&self, next: GenerationStatus) -> bool {
        match self {
            GenerationStatus::Pending => next != GenerationStatus::Pending,
            GenerationStatus::Generating => next.is_terminal(),
            GenerationStatus::Completed | GenerationStatus::Failed => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Pending => "pending",
            GenerationStatus::Generating => "generating",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(GenerationStatus::Pending),
            "generating" => Ok(GenerationStatus::Generating),
            "completed" => Ok(GenerationStatus::Completed),
            "failed" => Ok(GenerationStatus::Failed),
            other => Err(format!("unknown generation status '{}'", other)),
        }
    }
}

/// Persisted audit entry for one generation attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRecord {
    pub id: String,
    pub user_id: String,

    /// Model requested (the primary of the fallback plan)
    pub model: String,

    pub content_type: ContentType,
    pub prompt: String,

    /// Prompt length in characters
    pub prompt_length: u64,

    pub status: GenerationStatus,

    /// Present exactly when `status` is `Completed`
    pub generated_content: Option<String>,

    pub generation_time_ms: u64,

    /// Generated content length in characters
    pub content_length: u64,

    /// Present exactly when `status` is `Failed`
    pub error_message: Option<String>,

    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when a record is first created
#[derive(Debug, Clone, PartialEq)]
pub struct NewGeneration {
    pub model: String,
    pub content_type: ContentType,
    pub prompt: String,
    pub metadata: serde_json::Value,
}

/// A lifecycle step applied to an existing record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordUpdate {
    Generating,
    Completed {
        content: String,
        generation_time_ms: u64,
    },
    /// `partial_content` is kept in the record metadata, never as generated content
    Failed {
        error_message: String,
        generation_time_ms: u64,
        partial_content: Option<String>,
    },
}

impl RecordUpdate {
    pub fn target_status(&self) -> GenerationStatus {
        match self {
            RecordUpdate::Generating => GenerationStatus::Generating,
            RecordUpdate::Completed { .. } => GenerationStatus::Completed,
            RecordUpdate::Failed { .. } => GenerationStatus::Failed,
        }
    }
}

impl GenerationRecord {
    /// Build a `Pending` record
    pub fn pending(
        id: String,
        user_id: &str,
        new: NewGeneration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id: user_id.to_string(),
            model: new.model,
            content_type: new.content_type,
            prompt_length: new.prompt.chars().count() as u64,
            prompt: new.prompt,
            status: GenerationStatus::Pending,
            generated_content: None,
            generation_time_ms: 0,
            content_length: 0,
            error_message: None,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a lifecycle step, refusing any change to a terminal record
    pub fn apply(&mut self, update: RecordUpdate, now: DateTime<Utc>) -> Result<(), PersistenceError> {
        let next = update.target_status();
        if !self.status.can_transition_to(next) {
            return Err(PersistenceError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }

        match update {
            RecordUpdate::Generating => {}
            RecordUpdate::Completed {
                content,
                generation_time_ms,
            } => {
                self.content_length = content.chars().count() as u64;
                self.generated_content = Some(content);
                self.generation_time_ms = generation_time_ms;
            }
            RecordUpdate::Failed {
                error_message,
                generation_time_ms,
                partial_content,
            } => {
                if let (Some(partial), Some(fields)) =
                    (partial_content, self.metadata.as_object_mut())
                {
                    fields.insert(
                        "partial_content".to_string(),
                        serde_json::Value::String(partial),
                    );
                }
                self.error_message = Some(error_message);
                self.generation_time_ms = generation_time_ms;
            }
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

/// A request to generate content
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,

    /// Primary model; the generator's default when `None`
    pub model: Option<String>,

    pub content_type: ContentType,
    pub sampling: SamplingParams,

    /// Stream the response; the generator's setting when `None`
    pub streaming: Option<bool>,

    /// Models to try after the primary; the generator's list when empty
    pub fallback_models: Vec<String>,

    /// Write a generation record
    pub persist: bool,

    /// Caller data stored with the record
    pub metadata: serde_json::Value,

    pub cancel: CancellationToken,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: None,
            content_type: ContentType::General,
            sampling: SamplingParams::default(),
            streaming: None,
            fallback_models: Vec::new(),
            persist: true,
            metadata: serde_json::Value::Object(Default::default()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = Some(streaming);
        self
    }

    pub fn with_fallback_models(mut self, models: Vec<String>) -> Self {
        self.fallback_models = models;
        self
    }

    pub fn without_persistence(mut self) -> Self {
        self.persist = false;
        self
    }
}

/// Result of a successful `generate_content` call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub content: String,

    /// Model that produced the content
    pub model: String,

    pub requested_model: String,
    pub fallback_used: bool,
    pub failed_attempts: Vec<ModelAttempt>,

    /// The finalized record, when one was written
    pub record: Option<GenerationRecord>,

    /// Set when the content was produced but the record could not be finalized
    pub persistence_warning: Option<String>,
}

/// History query
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationFilter {
    pub content_type: Option<ContentType>,
    pub status: Option<GenerationStatus>,
    pub created_after: Option<DateTime<Utc>>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for GenerationFilter {
    fn default() -> Self {
        Self {
            content_type: None,
            status: None,
            created_after: None,
            limit: 50,
            offset: 0,
        }
    }
}

impl GenerationFilter {
    /// Every record, no paging
    pub fn unbounded() -> Self {
        Self {
            limit: usize::MAX,
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &GenerationRecord) -> bool {
        self.content_type.map_or(true, |t| record.content_type == t)
            && self.status.map_or(true, |s| record.status == s)
            && self.created_after.map_or(true, |after| record.created_at >= after)
    }

    /// Filter, order most recent first (ties by id), then page
    pub fn apply<'a, I>(&self, records: I) -> Vec<GenerationRecord>
    where
        I: IntoIterator<Item = &'a GenerationRecord>,
    {
        let mut matched: Vec<&GenerationRecord> =
            records.into_iter().filter(|r| self.matches(r)).collect();
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        matched
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .cloned()
            .collect()
    }
}
