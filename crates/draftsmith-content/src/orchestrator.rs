//! Content generation with fallback and record keeping
//!
//! One call to [`GenerationOrchestrator::generate_content`] validates the request,
//! writes a `Pending` record, moves it to `Generating`, runs the fallback plan and
//! finalizes the record as `Completed` or `Failed` before returning.

use std::{sync::Arc, time::Instant};

use chrono::Utc;
use draftsmith_ollama::{
    ContentGenerator, FallbackGeneration, FallbackOptions, GenerateOptions, InferenceError,
    ProgressFn, StreamChunk,
};
use tracing::{debug, error, info, warn};

use crate::{
    error::{GenerationError, PersistenceError},
    models::{
        GenerationFilter, GenerationOutcome, GenerationRecord, GenerationRequest,
        NewGeneration, RecordUpdate,
    },
    stats::{GenerationStats, StatsTimeframe},
    store::GenerationStore,
};

/// Drives generation requests through the inference backend and the record store
#[derive(Clone)]
pub struct GenerationOrchestrator {
    generator: Arc<dyn ContentGenerator>,
    store: Arc<dyn GenerationStore>,
}

impl std::fmt::Debug for GenerationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationOrchestrator")
            .field("default_model", &self.generator.default_model())
            .finish_non_exhaustive()
    }
}

impl GenerationOrchestrator {
    pub fn new(generator: Arc<dyn ContentGenerator>, store: Arc<dyn GenerationStore>) -> Self {
        Self { generator, store }
    }

    pub fn generator(&self) -> &Arc<dyn ContentGenerator> {
        &self.generator
    }

    pub fn store(&self) -> &Arc<dyn GenerationStore> {
        &self.store
    }

    /// Generate content for `user_id`, recording the attempt when `request.persist`.
    ///
    /// Streamed chunks reach `progress` unchanged and in order. The record is terminal
    /// when this returns; a record that could not be finalized is reported through
    /// [`GenerationOutcome::persistence_warning`] rather than as an error.
    ///
    /// # Errors
    /// - `InvalidRequest` for an empty prompt, an empty model name or out-of-range
    ///   sampling parameters
    /// - `Persistence` when the pending record cannot be created
    /// - `Inference` when every model fails or the request is cancelled
    pub async fn generate_content(
        &self,
        user_id: &str,
        request: GenerationRequest,
        progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<GenerationOutcome, GenerationError> {
        validate_request(&request)?;

        let requested_model = request
            .model
            .clone()
            .unwrap_or_else(|| self.generator.default_model().to_string());
        let started = Instant::now();

        let record = if request.persist {
            Some(self.start_record(user_id, &requested_model, &request).await?)
        } else {
            None
        };

        let options = FallbackOptions {
            options: GenerateOptions {
                model: Some(requested_model.clone()),
                stream: request.streaming,
                sampling: request.sampling,
                cancel: request.cancel.clone(),
            },
            fallback_models: if request.fallback_models.is_empty() {
                None
            } else {
                Some(request.fallback_models.clone())
            },
        };

        let result = self.run(&request.prompt, &options, progress).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(generated) => {
                info!(
                    "Generated {} chars with {} in {}ms",
                    generated.generation.content.chars().count(),
                    generated.model_used,
                    elapsed_ms
                );
                let (record, persistence_warning) = match record {
                    Some(record) => {
                        self.finalize(
                            &record,
                            RecordUpdate::Completed {
                                content: generated.generation.content.clone(),
                                generation_time_ms: elapsed_ms,
                            },
                        )
                        .await
                    }
                    None => (None, None),
                };

                Ok(GenerationOutcome {
                    content: generated.generation.content,
                    model: generated.model_used,
                    requested_model: generated.requested_model,
                    fallback_used: generated.fallback_used,
                    failed_attempts: generated.failed_attempts,
                    record,
                    persistence_warning,
                })
            }
            Err(err) => {
                warn!("Generation for {} failed after {}ms: {}", user_id, elapsed_ms, err);
                let warning = match record {
                    Some(record) => {
                        self.finalize(
                            &record,
                            RecordUpdate::Failed {
                                error_message: err.to_string(),
                                generation_time_ms: elapsed_ms,
                                partial_content: err.partial_content().map(str::to_string),
                            },
                        )
                        .await
                        .1
                    }
                    None => None,
                };
                Err(match warning {
                    Some(warning) => GenerationError::Unrecorded {
                        error: err,
                        warning,
                    },
                    None => GenerationError::Inference(err),
                })
            }
        }
    }

    /// Create the pending record and mark it as generating
    async fn start_record(
        &self,
        user_id: &str,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationRecord, GenerationError> {
        let mut metadata = request.metadata.clone();
        if let Some(fields) = metadata.as_object_mut() {
            fields.insert(
                "started_at".to_string(),
                serde_json::Value::String(Utc::now().to_rfc3339()),
            );
        }

        let record = self
            .store
            .create(
                user_id,
                NewGeneration {
                    model: model.to_string(),
                    content_type: request.content_type,
                    prompt: request.prompt.clone(),
                    metadata,
                },
            )
            .await?;

        match self.store.update(&record.id, RecordUpdate::Generating).await {
            Ok(updated) => Ok(updated),
            Err(e) => {
                warn!("Failed to mark generation {} as generating: {}", record.id, e);
                Ok(record)
            }
        }
    }

    async fn run(
        &self,
        prompt: &str,
        options: &FallbackOptions,
        progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<FallbackGeneration, InferenceError> {
        let Some(progress) = progress else {
            return self
                .generator
                .generate_with_fallback(prompt, options, None)
                .await;
        };

        let mut chunks = 0_usize;
        let mut forward = |chunk: &StreamChunk| {
            chunks += 1;
            if chunk.is_final {
                debug!(
                    "Stream finished after {} chunks ({} chars)",
                    chunks,
                    chunk.accumulated.chars().count()
                );
            }
            progress(chunk);
        };
        self.generator
            .generate_with_fallback(prompt, options, Some(&mut forward))
            .await
    }

    /// Apply a terminal update; failures come back as a warning, never an error
    async fn finalize(
        &self,
        record: &GenerationRecord,
        update: RecordUpdate,
    ) -> (Option<GenerationRecord>, Option<String>) {
        match self.store.update(&record.id, update).await {
            Ok(updated) => (Some(updated), None),
            Err(e) => {
                error!("Failed to finalize generation record {}: {}", record.id, e);
                (
                    Some(record.clone()),
                    Some(format!("generation record {} was not finalized: {}", record.id, e)),
                )
            }
        }
    }

    /// A user's generation history, most recent first
    pub async fn history(
        &self,
        user_id: &str,
        filter: &GenerationFilter,
    ) -> Result<Vec<GenerationRecord>, PersistenceError> {
        self.store.list(user_id, filter).await
    }

    /// Statistics over the user's generations created within `timeframe`
    pub async fn stats(
        &self,
        user_id: &str,
        timeframe: StatsTimeframe,
    ) -> Result<GenerationStats, PersistenceError> {
        let filter = GenerationFilter {
            created_after: Some(timeframe.since(Utc::now())),
            ..GenerationFilter::unbounded()
        };
        let records = self.store.list(user_id, &filter).await?;
        Ok(GenerationStats::from_records(&records))
    }
}

fn validate_request(request: &GenerationRequest) -> Result<(), GenerationError> {
    if request.prompt.trim().is_empty() {
        return Err(GenerationError::InvalidRequest(
            "Prompt cannot be empty".to_string(),
        ));
    }
    if matches!(&request.model, Some(model) if model.trim().is_empty()) {
        return Err(GenerationError::InvalidRequest(
            "Model name cannot be empty".to_string(),
        ));
    }
    request
        .sampling
        .validate()
        .map_err(|e| GenerationError::InvalidRequest(e.to_string()))
}
