//! In-memory store implementations
//!
//! Thread-safe, suitable for tests and for embedding.

mod generation_store;
mod template_store;

pub use generation_store::InMemoryGenerationStore;
pub use template_store::InMemoryTemplateStore;
