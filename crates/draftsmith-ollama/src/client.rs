//! HTTP client for the Ollama inference daemon
//!
//! Covers health probing, model listing, blocking and streamed generation, and the
//! model lifecycle calls (pull, delete, show). The client owns nothing but its
//! configuration and a pooled `reqwest::Client`, so clones are cheap and concurrent
//! calls never share mutable state.

use std::{future::Future, sync::Arc, time::Duration};

use futures::StreamExt;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::OllamaConfig,
    error::InferenceError,
    models::{
        ConnectionStatus, Generation, HealthReport, ModelDescriptor, ProgressFn, PullOutcome,
        PullProgressFn, SamplingParams,
    },
    stream::{parse_timestamp, GenerationStream, LineBuffer, PullStream},
    Result,
};

/// Default pool idle timeout (90 seconds)
const DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Default TCP keep-alive interval (60 seconds)
const DEFAULT_TCP_KEEPALIVE_SECS: u64 = 60;

/// Health check timeout (5 seconds)
const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

/// Pulls download whole models; give the header phase more room than a generation
const PULL_TIMEOUT_SECS: u64 = 3600;

/// Per-call generation options
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Model to use; the configured default when `None`
    pub model: Option<String>,

    /// Stream the response; the configured flag when `None`
    pub stream: Option<bool>,

    pub sampling: SamplingParams,

    /// Cancels the request at send time or between streamed chunks
    pub cancel: CancellationToken,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            model: None,
            stream: None,
            sampling: SamplingParams::default(),
            cancel: CancellationToken::new(),
        }
    }
}

impl GenerateOptions {
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Self::default()
        }
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Ollama inference client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    config: Arc<OllamaConfig>,
}

impl OllamaClient {
    /// Create a client from an explicit configuration
    ///
    /// # Errors
    /// Returns `Config` if the configuration does not validate or the HTTP client
    /// cannot be built
    pub fn new(mut config: OllamaConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .pool_idle_timeout(Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT_SECS))
            .tcp_keepalive(Duration::from_secs(DEFAULT_TCP_KEEPALIVE_SECS))
            .build()
            .map_err(|e| InferenceError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Create a client for the default localhost endpoint
    pub fn with_default_endpoint() -> Result<Self> {
        Self::new(OllamaConfig::default())
    }

    /// Create a client from config files and environment
    pub fn from_config() -> Result<Self> {
        let config = OllamaConfig::load_with_precedence()?;
        debug!(
            "Creating OllamaClient from configuration: base_url={}, default_model={}",
            config.base_url, config.default_model
        );
        Self::new(config)
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Check the daemon by listing its models. Never fails: any error is reported as
    /// `Disconnected`.
    pub async fn check_health(&self) -> HealthReport {
        debug!("Performing health check on {}", self.config.base_url);

        let check = async {
            let response = self
                .client
                .get(self.url("/api/tags"))
                .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS))
                .send()
                .await?;
            let response = ensure_success(response).await?;
            let tags: TagsResponse = response.json().await?;
            Ok::<_, InferenceError>(tags.into_descriptors())
        };

        match check.await {
            Ok(models) => {
                debug!("Health check passed, {} models available", models.len());
                HealthReport {
                    status: ConnectionStatus::Connected,
                    models,
                    error: None,
                }
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
                HealthReport {
                    status: ConnectionStatus::Disconnected,
                    models: Vec::new(),
                    error: Some(format!(
                        "Cannot connect to Ollama at {}: {}",
                        self.config.base_url, e
                    )),
                }
            }
        }
    }

    /// Health check with up to 3 attempts and exponential backoff (100ms, 200ms)
    pub async fn check_health_with_retry(&self) -> HealthReport {
        const MAX_ATTEMPTS: u32 = 3;
        const INITIAL_BACKOFF_MS: u64 = 100;

        let mut attempt = 0;
        loop {
            let report = self.check_health().await;
            attempt += 1;
            if report.is_connected() || attempt >= MAX_ATTEMPTS {
                return report;
            }
            let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt - 1);
            debug!(
                "Health check attempt {} failed, retrying in {}ms",
                attempt, backoff_ms
            );
            sleep(Duration::from_millis(backoff_ms)).await;
        }
    }

    /// List the models installed on the daemon
    pub async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        debug!("Listing models");

        let request = self.client.get(self.url("/api/tags"));
        let tags: TagsResponse = self
            .fetch_json(request, &CancellationToken::new(), self.config.request_timeout())
            .await?;

        let models = tags.into_descriptors();
        debug!("Listed {} models", models.len());
        Ok(models)
    }

    /// Like [`list_models`](Self::list_models), but logs failures and returns an empty list
    pub async fn list_models_or_empty(&self) -> Vec<ModelDescriptor> {
        match self.list_models().await {
            Ok(models) => models,
            Err(e) => {
                warn!("Failed to list models: {}", e);
                Vec::new()
            }
        }
    }

    /// Generate text for `prompt`.
    ///
    /// Streams when streaming is enabled (per call or by configuration) *and* a progress
    /// callback is supplied; otherwise issues one blocking request.
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
        progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<Generation> {
        let model = options
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone());
        validate_model_name(&model)?;
        options.sampling.validate()?;

        let stream = options.stream.unwrap_or(self.config.streaming_enabled);
        match progress {
            Some(progress) if stream => {
                self.generate_streaming(prompt, &model, options, progress)
                    .await
            }
            _ => self.generate_blocking(prompt, &model, options).await,
        }
    }

    async fn generate_blocking(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerateOptions,
    ) -> Result<Generation> {
        debug!("Sending generate request for model: {}", model);

        let body = GenerateRequest::new(model, prompt, false, &options.sampling);
        let request = self.client.post(self.url("/api/generate")).json(&body);
        let response: GenerateResponse = self
            .fetch_json(request, &options.cancel, self.config.request_timeout())
            .await
            .map_err(|e| model_not_found(e, model))?;

        Ok(Generation {
            content: response.response,
            model: response.model.unwrap_or_else(|| model.to_string()),
            created_at: response.created_at.as_deref().and_then(parse_timestamp),
            done: true,
        })
    }

    async fn generate_streaming(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerateOptions,
        progress: &mut ProgressFn<'_>,
    ) -> Result<Generation> {
        debug!("Starting streaming generate request for model: {}", model);

        let body = GenerateRequest::new(model, prompt, true, &options.sampling);
        let request = self.client.post(self.url("/api/generate")).json(&body);
        let response = self
            .run(
                async { ensure_success(request.send().await?).await },
                &options.cancel,
                self.config.request_timeout(),
            )
            .await
            .map_err(|e| model_not_found(e, model))?;

        let mut parser = GenerationStream::new();
        let mut lines = LineBuffer::new();
        let mut body = response.bytes_stream();
        let idle = self.config.stream_idle_timeout();

        loop {
            let next = tokio::select! {
                biased;
                _ = options.cancel.cancelled() => return Err(InferenceError::Cancelled),
                next = timeout(idle, body.next()) => next,
            };

            let batch = match next {
                Err(_) => {
                    return Err(InferenceError::StreamInterrupted {
                        partial: parser.accumulated().to_string(),
                        reason: format!("no data received for {}s", idle.as_secs()),
                    })
                }
                Ok(Some(Err(e))) => {
                    return Err(InferenceError::StreamInterrupted {
                        partial: parser.accumulated().to_string(),
                        reason: e.to_string(),
                    })
                }
                Ok(Some(Ok(bytes))) => lines.push(&bytes),
                Ok(None) => {
                    let tail: Vec<String> = lines.finish().into_iter().collect();
                    for line in &tail {
                        if let Some(chunk) = parser.feed_line(line)? {
                            progress(&chunk);
                        }
                        if parser.is_finished() {
                            break;
                        }
                    }
                    if !parser.is_finished() {
                        warn!("Stream for {} ended without a terminal object", model);
                        let chunk = parser.close();
                        progress(&chunk);
                    }
                    return Ok(parser.into_generation(model));
                }
            };

            for line in &batch {
                if let Some(chunk) = parser.feed_line(line)? {
                    progress(&chunk);
                }
                if parser.is_finished() {
                    info!(
                        "Streamed generation finished for {} ({} chars)",
                        model,
                        parser.accumulated().chars().count()
                    );
                    return Ok(parser.into_generation(model));
                }
            }
        }
    }

    /// Pull (download) a model. With a callback, progress is streamed line by line.
    pub async fn pull_model(
        &self,
        model_name: &str,
        progress: Option<&mut PullProgressFn<'_>>,
        cancel: &CancellationToken,
    ) -> Result<PullOutcome> {
        validate_model_name(model_name)?;
        debug!("Pulling model: {}", model_name);

        let stream = progress.is_some();
        let body = serde_json::json!({ "name": model_name, "stream": stream });
        let request = self.client.post(self.url("/api/pull")).json(&body);
        let pull_timeout = Duration::from_secs(PULL_TIMEOUT_SECS);

        let Some(progress) = progress else {
            let status: PullStatus = self.fetch_json(request, cancel, pull_timeout).await?;
            info!("Pulled model {}: {}", model_name, status.status);
            return Ok(PullOutcome::Status(status.status));
        };

        let response = self
            .run(
                async { ensure_success(request.send().await?).await },
                cancel,
                pull_timeout,
            )
            .await?;

        let mut parser = PullStream::new(model_name);
        let mut lines = LineBuffer::new();
        let mut body = response.bytes_stream();
        let idle = self.config.stream_idle_timeout();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(InferenceError::Cancelled),
                next = timeout(idle, body.next()) => next,
            };

            let (batch, ended) = match next {
                Err(_) => {
                    return Err(InferenceError::Timeout(format!(
                        "no pull progress for {}s",
                        idle.as_secs()
                    )))
                }
                Ok(Some(Err(e))) => return Err(InferenceError::from(e)),
                Ok(Some(Ok(bytes))) => (lines.push(&bytes), false),
                Ok(None) => (lines.finish().into_iter().collect::<Vec<_>>(), true),
            };

            for line in &batch {
                if let Some(update) = parser.feed_line(line)? {
                    progress(&update);
                }
                if parser.succeeded() {
                    info!("Successfully pulled model: {}", model_name);
                    return Ok(PullOutcome::Completed);
                }
            }

            if ended {
                info!("Pull stream for {} ended", model_name);
                return Ok(PullOutcome::Completed);
            }
        }
    }

    /// Remove a model from the daemon
    pub async fn delete_model(&self, model_name: &str) -> Result<()> {
        validate_model_name(model_name)?;
        debug!("Deleting model: {}", model_name);

        let request = self
            .client
            .delete(self.url("/api/delete"))
            .json(&serde_json::json!({ "name": model_name }));
        self.run(
            async { ensure_success(request.send().await?).await },
            &CancellationToken::new(),
            self.config.request_timeout(),
        )
        .await
        .map_err(|e| model_not_found(e, model_name))?;

        info!("Successfully deleted model: {}", model_name);
        Ok(())
    }

    /// Fetch the daemon's description of a model (`/api/show`), as raw JSON
    pub async fn get_model_info(&self, model_name: &str) -> Result<serde_json::Value> {
        validate_model_name(model_name)?;
        debug!("Getting model info: {}", model_name);

        let request = self
            .client
            .post(self.url("/api/show"))
            .json(&serde_json::json!({ "name": model_name }));
        self.fetch_json(request, &CancellationToken::new(), self.config.request_timeout())
            .await
            .map_err(|e| model_not_found(e, model_name))
    }

    /// Send a request and decode a JSON body, bounded by `limit` and `cancel`
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        cancel: &CancellationToken,
        limit: Duration,
    ) -> Result<T> {
        self.run(
            async {
                let response = ensure_success(request.send().await?).await?;
                let bytes = response.bytes().await?;
                serde_json::from_slice::<T>(&bytes).map_err(InferenceError::from)
            },
            cancel,
            limit,
        )
        .await
    }

    async fn run<T, F>(&self, work: F, cancel: &CancellationToken, limit: Duration) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(InferenceError::Cancelled),
            result = timeout(limit, work) => match result {
                Ok(result) => result,
                Err(_) => Err(InferenceError::Timeout(format!(
                    "no response from {} within {}s",
                    self.config.base_url,
                    limit.as_secs()
                ))),
            },
        }
    }
}

fn validate_model_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(InferenceError::InvalidModelName(
            "Model name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn model_not_found(err: InferenceError, model: &str) -> InferenceError {
    match err {
        InferenceError::Http { status: 404, .. } => {
            InferenceError::ModelNotFound(model.to_string())
        }
        other => other,
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    warn!("Daemon returned {}: {}", status, message);
    Err(InferenceError::Http {
        status: status.as_u16(),
        body: message,
    })
}

/// `/api/generate` request body
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: WireOptions,
}

impl<'a> GenerateRequest<'a> {
    fn new(model: &'a str, prompt: &'a str, stream: bool, sampling: &SamplingParams) -> Self {
        Self {
            model,
            prompt,
            stream,
            options: WireOptions {
                temperature: sampling.temperature,
                num_predict: sampling.max_tokens,
                top_p: sampling.top_p,
                repeat_penalty: sampling.repeat_penalty,
            },
        }
    }
}

/// Sampling options in the daemon's naming
#[derive(Debug, Serialize)]
struct WireOptions {
    temperature: f32,
    num_predict: u32,
    top_p: f32,
    repeat_penalty: f32,
}

/// Non-streamed `/api/generate` response
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    model: Option<String>,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PullStatus {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// `/api/tags` response
#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Option<Vec<ModelTag>>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
    #[serde(default)]
    size: u64,
    modified_at: Option<String>,
    #[serde(default)]
    digest: String,
}

impl TagsResponse {
    fn into_descriptors(self) -> Vec<ModelDescriptor> {
        self.models
            .unwrap_or_default()
            .into_iter()
            .map(|tag| ModelDescriptor {
                name: tag.name,
                size_bytes: tag.size,
                modified_at: tag
                    .modified_at
                    .as_deref()
                    .and_then(parse_timestamp)
                    .unwrap_or_default(),
                digest: tag.digest,
            })
            .collect()
    }
}
