//! Draftsmith content generation
//!
//! Orchestrates generation requests on top of [`draftsmith_ollama`]: multi-model
//! fallback, a persisted record per attempt, history and statistics queries, and
//! reusable prompt templates.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 GenerationOrchestrator                    │
//! ├────────────────────────────┬─────────────────────────────┤
//! │  ContentGenerator (trait)  │  GenerationStore (trait)     │
//! │  ────────────────────────  │  ─────────────────────────   │
//! │  OllamaClient              │  InMemoryGenerationStore     │
//! │                            │  JsonFileGenerationStore     │
//! └────────────────────────────┴─────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use draftsmith_content::{GenerationOrchestrator, GenerationRequest, InMemoryGenerationStore};
//! use draftsmith_ollama::OllamaClient;
//! use std::sync::Arc;
//!
//! let orchestrator = GenerationOrchestrator::new(
//!     Arc::new(OllamaClient::from_config()?),
//!     Arc::new(InMemoryGenerationStore::new()),
//! );
//! let outcome = orchestrator
//!     .generate_content("local", GenerationRequest::new("Write a haiku"), None)
//!     .await?;
//! ```

pub mod error;
pub mod file_store;
pub mod memory;
pub mod models;
pub mod orchestrator;
pub mod stats;
pub mod store;
pub mod templates;

pub use error::{GenerationError, PersistenceError, TemplateError};
pub use file_store::JsonFileGenerationStore;
pub use memory::{InMemoryGenerationStore, InMemoryTemplateStore};
pub use models::{
    ContentType, GenerationFilter, GenerationOutcome, GenerationRecord, GenerationRequest,
    GenerationStatus, NewGeneration, RecordUpdate,
};
pub use orchestrator::GenerationOrchestrator;
pub use stats::{GenerationStats, StatsTimeframe};
pub use store::{GenerationStore, PersistenceResult, TemplateStore};
pub use templates::{ContentTemplate, NewTemplate};
