//! The seam between content orchestration and the inference backend

use async_trait::async_trait;

use crate::{
    client::OllamaClient,
    fallback::{FallbackGeneration, FallbackOptions},
    models::ProgressFn,
    Result,
};

/// Something that can turn a prompt into content, trying several models if needed
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Model used when a request names none
    fn default_model(&self) -> &str;

    /// Whether generation streams when a request does not say
    fn streaming_enabled(&self) -> bool;

    async fn generate_with_fallback(
        &self,
        prompt: &str,
        options: &FallbackOptions,
        progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<FallbackGeneration>;
}

#[async_trait]
impl ContentGenerator for OllamaClient {
    fn default_model(&self) -> &str {
        &self.config().default_model
    }

    fn streaming_enabled(&self) -> bool {
        self.config().streaming_enabled
    }

    async fn generate_with_fallback(
        &self,
        prompt: &str,
        options: &FallbackOptions,
        progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<FallbackGeneration> {
        OllamaClient::generate_with_fallback(self, prompt, options, progress).await
    }
}
