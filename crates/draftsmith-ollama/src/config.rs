//! Inference client configuration
//!
//! Handles loading and validating the Ollama client configuration from:
//! 1. Environment variables (highest priority)
//! 2. Project config file (.draftsmith/config.yaml)
//! 3. Global config file (~/.draftsmith/config.yaml)
//! 4. Built-in defaults (lowest priority)
//!
//! The loaded value is immutable; pass it to [`crate::OllamaClient::new`].

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{error::InferenceError, fallback::DEFAULT_FALLBACK_MODELS, Result};

/// Ollama client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OllamaConfig {
    /// Base URL for the daemon (default: http://localhost:11434)
    pub base_url: String,
    /// Model used when a request names none (default: llama2)
    pub default_model: String,
    /// Whether generation streams by default (default: false)
    pub streaming_enabled: bool,
    /// Models tried after the primary one fails
    pub fallback_models: Vec<String>,
    /// TCP connect timeout in seconds (default: 5)
    pub connect_timeout_secs: u64,
    /// Whole-request timeout for non-streamed calls, and the header phase of streamed ones (default: 120)
    pub request_timeout_secs: u64,
    /// Longest allowed gap between two streamed chunks (default: 60)
    pub stream_idle_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            default_model: "llama2".to_string(),
            streaming_enabled: false,
            fallback_models: DEFAULT_FALLBACK_MODELS.iter().map(|m| m.to_string()).collect(),
            connect_timeout_secs: 5,
            request_timeout_secs: 120,
            stream_idle_timeout_secs: 60,
        }
    }
}

impl OllamaConfig {
    /// Load configuration with precedence: env > project file > global file > defaults
    pub fn load_with_precedence() -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_config_path) = Self::global_config_path() {
            if global_config_path.exists() {
                debug!("Loading global config from {:?}", global_config_path);
                config.merge_from_file(&global_config_path)?;
            }
        }

        let project_config_path = Self::project_config_path();
        if project_config_path.exists() {
            debug!("Loading project config from {:?}", project_config_path);
            config.merge_from_file(&project_config_path)?;
        }

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Global configuration path (~/.draftsmith/config.yaml)
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".draftsmith").join("config.yaml"))
    }

    /// Project configuration path (.draftsmith/config.yaml)
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".draftsmith").join("config.yaml")
    }

    /// Override fields from environment variables
    pub fn load_from_env(&mut self) {
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            debug!("Loading OLLAMA_BASE_URL from environment: {}", url);
            self.base_url = url;
        }

        if let Ok(model) = std::env::var("OLLAMA_DEFAULT_MODEL") {
            debug!("Loading OLLAMA_DEFAULT_MODEL from environment: {}", model);
            self.default_model = model;
        }

        if let Ok(flag) = std::env::var("OLLAMA_ENABLE_STREAMING") {
            self.streaming_enabled = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes"
            );
        }

        if let Ok(models) = std::env::var("OLLAMA_FALLBACK_MODELS") {
            self.fallback_models = models
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(secs) = env_secs("OLLAMA_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout_secs = secs;
        }
        if let Some(secs) = env_secs("OLLAMA_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs;
        }
        if let Some(secs) = env_secs("OLLAMA_STREAM_IDLE_TIMEOUT_SECS") {
            self.stream_idle_timeout_secs = secs;
        }
    }

    /// Merge values from a YAML file; keys absent from the file keep their current value
    pub fn merge_from_file(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| InferenceError::Config(format!("Failed to read config file: {}", e)))?;

        let file_config: FileConfig = serde_yaml::from_str(&content)
            .map_err(|e| InferenceError::Config(format!("Failed to parse config file: {}", e)))?;

        if let Some(ollama) = file_config.ollama {
            if let Some(base_url) = ollama.base_url {
                self.base_url = base_url;
            }
            if let Some(default_model) = ollama.default_model {
                self.default_model = default_model;
            }
            if let Some(streaming_enabled) = ollama.streaming_enabled {
                self.streaming_enabled = streaming_enabled;
            }
            if let Some(fallback_models) = ollama.fallback_models {
                self.fallback_models = fallback_models;
            }
            if let Some(secs) = ollama.connect_timeout_secs {
                self.connect_timeout_secs = secs;
            }
            if let Some(secs) = ollama.request_timeout_secs {
                self.request_timeout_secs = secs;
            }
            if let Some(secs) = ollama.stream_idle_timeout_secs {
                self.stream_idle_timeout_secs = secs;
            }
        }

        Ok(())
    }

    /// Validate the configuration and normalize the base URL
    pub fn validate(&mut self) -> Result<()> {
        let trimmed = self.base_url.trim().trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            return Err(InferenceError::Config(
                "Ollama base URL is required".to_string(),
            ));
        }
        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(InferenceError::Config(format!(
                "Ollama base URL must start with http:// or https://: {}",
                self.base_url
            )));
        }
        self.base_url = trimmed;

        if self.default_model.trim().is_empty() {
            return Err(InferenceError::Config(
                "Default model cannot be empty".to_string(),
            ));
        }

        if self.connect_timeout_secs == 0
            || self.request_timeout_secs == 0
            || self.stream_idle_timeout_secs == 0
        {
            return Err(InferenceError::Config(
                "Timeouts must be greater than 0 seconds".to_string(),
            ));
        }

        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs)
    }
}

fn env_secs(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => {
            debug!("Loading {} from environment: {}", name, secs);
            Some(secs)
        }
        Err(_) => {
            warn!("Invalid {} value: {}", name, raw);
            None
        }
    }
}

/// YAML file structure
#[derive(Debug, Deserialize)]
struct FileConfig {
    ollama: Option<FileSettings>,
}

/// Settings from the YAML file (all fields optional)
#[derive(Debug, Deserialize)]
struct FileSettings {
    base_url: Option<String>,
    default_model: Option<String>,
    streaming_enabled: Option<bool>,
    fallback_models: Option<Vec<String>>,
    connect_timeout_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    stream_idle_timeout_secs: Option<u64>,
}
