//! Multi-model fallback
//!
//! The primary model is tried first, then each fallback model in order. The first
//! success wins; every failure is kept so callers can report why each model was skipped.

use tracing::{debug, info, warn};

use crate::{
    client::{GenerateOptions, OllamaClient},
    error::{InferenceError, ModelAttempt},
    models::{Generation, ProgressFn, StreamChunk},
    Result,
};

/// Models tried after the primary when nothing else is configured
pub const DEFAULT_FALLBACK_MODELS: &[&str] = &["llama2", "mistral", "neural-chat"];

/// Options for [`OllamaClient::generate_with_fallback`]
#[derive(Debug, Clone, Default)]
pub struct FallbackOptions {
    /// Options for each attempt; `options.model` is the primary model
    pub options: GenerateOptions,

    /// Models tried after the primary; the configured list when `None`
    pub fallback_models: Option<Vec<String>>,
}

/// A successful fallback generation
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackGeneration {
    pub generation: Generation,

    /// First model of the plan
    pub requested_model: String,

    /// Model that produced the content
    pub model_used: String,

    /// True when `model_used` differs from `requested_model`
    pub fallback_used: bool,

    /// Models that failed before `model_used` succeeded
    pub failed_attempts: Vec<ModelAttempt>,
}

/// Order in which models are tried: the primary, then the fallbacks with duplicates and
/// the primary removed
pub fn fallback_plan(primary: &str, fallbacks: &[String]) -> Vec<String> {
    let mut plan = vec![primary.to_string()];
    for model in fallbacks {
        let model = model.trim();
        if model.is_empty() || plan.iter().any(|m| m == model) {
            continue;
        }
        plan.push(model.to_string());
    }
    plan
}

/// Errors that end the loop instead of moving on to the next model
fn is_fatal(err: &InferenceError) -> bool {
    matches!(
        err,
        InferenceError::Cancelled | InferenceError::InvalidParameter(_)
    )
}

impl OllamaClient {
    /// Generate with the primary model, falling back through the plan on failure.
    ///
    /// # Errors
    /// `AllModelsFailed` when every model fails; `Cancelled` or `InvalidParameter`
    /// immediately, without trying further models
    pub async fn generate_with_fallback(
        &self,
        prompt: &str,
        options: &FallbackOptions,
        mut progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<FallbackGeneration> {
        let primary = options
            .options
            .model
            .clone()
            .unwrap_or_else(|| self.config().default_model.clone());
        let fallbacks = options
            .fallback_models
            .as_deref()
            .unwrap_or(&self.config().fallback_models);
        let plan = fallback_plan(&primary, fallbacks);
        debug!("Fallback plan: {}", plan.join(" -> "));

        let mut failed_attempts = Vec::new();
        // A failed attempt already streamed text to the caller
        let mut discarded_output = false;
        for model in &plan {
            let attempt = GenerateOptions {
                model: Some(model.clone()),
                ..options.options.clone()
            };

            let mut emitted = false;
            let result = match progress.as_deref_mut() {
                Some(progress) => {
                    let mut restart_pending = discarded_output;
                    let mut forward = |chunk: &StreamChunk| {
                        emitted = true;
                        if restart_pending {
                            restart_pending = false;
                            progress(&StreamChunk {
                                restarted: true,
                                ..chunk.clone()
                            });
                        } else {
                            progress(chunk);
                        }
                    };
                    self.generate(prompt, &attempt, Some(&mut forward)).await
                }
                None => self.generate(prompt, &attempt, None).await,
            };

            match result {
                Ok(generation) => {
                    let fallback_used = *model != primary;
                    if fallback_used {
                        info!(
                            "Generated with fallback model {} after {} failure(s)",
                            model,
                            failed_attempts.len()
                        );
                    }
                    return Ok(FallbackGeneration {
                        generation,
                        requested_model: primary,
                        model_used: model.clone(),
                        fallback_used,
                        failed_attempts,
                    });
                }
                Err(e) if is_fatal(&e) => return Err(e),
                Err(e) => {
                    warn!("Model {} failed: {}", model, e);
                    discarded_output |= emitted;
                    failed_attempts.push(ModelAttempt {
                        model: model.clone(),
                        error: e,
                    });
                }
            }
        }

        Err(InferenceError::AllModelsFailed {
            attempts: failed_attempts,
        })
    }
}
