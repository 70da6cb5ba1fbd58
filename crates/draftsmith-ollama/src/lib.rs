//! Ollama inference client for Draftsmith
//!
//! This crate talks to a local Ollama daemon: health probing, model listing,
//! blocking and streamed generation with multi-model fallback, and model
//! pull/delete/show. Configuration is loaded once and never mutated.

pub mod client;
pub mod config;
pub mod error;
pub mod fallback;
pub mod generator;
pub mod models;
pub mod stream;

pub use client::{GenerateOptions, OllamaClient};
pub use config::OllamaConfig;
pub use error::{InferenceError, ModelAttempt};
pub use fallback::{fallback_plan, FallbackGeneration, FallbackOptions, DEFAULT_FALLBACK_MODELS};
pub use generator::ContentGenerator;
pub use models::{
    format_size, ConnectionStatus, Generation, HealthReport, ModelDescriptor, ProgressFn,
    PullOutcome, PullProgress, PullProgressFn, SamplingParams, StreamChunk,
};
pub use tokio_util::sync::CancellationToken;

/// Result type for inference operations
pub type Result<T> = std::result::Result<T, InferenceError>;
