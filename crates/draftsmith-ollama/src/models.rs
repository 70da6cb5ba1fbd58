//! Data models shared by the inference client and its callers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// A model installed on the daemon, as reported by `/api/tags`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Model name/ID (e.g., "llama2:7b")
    pub name: String,

    /// Model size in bytes
    pub size_bytes: u64,

    /// When the model was last modified
    pub modified_at: DateTime<Utc>,

    /// Content digest reported by the daemon
    pub digest: String,
}

impl ModelDescriptor {
    /// Human-readable size using 1024-based units, e.g. "3.8 GB"
    pub fn formatted_size(&self) -> String {
        format_size(self.size_bytes)
    }
}

/// Format a byte count the way model listings display it
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rendered = format!("{:.1}", value);
    let rendered = rendered.strip_suffix(".0").unwrap_or(&rendered);
    format!("{} {}", rendered, UNITS[unit])
}

/// Sampling parameters forwarded to the daemon's `options` object
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SamplingParams {
    /// Temperature in [0, 1]
    pub temperature: f32,

    /// Maximum tokens to generate (`num_predict`)
    pub max_tokens: u32,

    /// Nucleus sampling in (0, 1]
    pub top_p: f32,

    /// Repetition penalty, at least 1
    pub repeat_penalty: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
            top_p: 0.9,
            repeat_penalty: 1.1,
        }
    }
}

impl SamplingParams {
    /// Check every parameter against its accepted range
    pub fn validate(&self) -> Result<(), InferenceError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(InferenceError::InvalidParameter(format!(
                "temperature must be within [0, 1], got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(InferenceError::InvalidParameter(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(InferenceError::InvalidParameter(format!(
                "top_p must be within (0, 1], got {}",
                self.top_p
            )));
        }
        if self.repeat_penalty.is_nan() || self.repeat_penalty < 1.0 {
            return Err(InferenceError::InvalidParameter(format!(
                "repeat_penalty must be at least 1, got {}",
                self.repeat_penalty
            )));
        }
        Ok(())
    }
}

/// A finished generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Generation {
    /// Full generated text
    pub content: String,

    /// Model reported by the daemon (falls back to the requested model)
    pub model: String,

    pub created_at: Option<DateTime<Utc>>,

    pub done: bool,
}

/// One incremental update delivered to a progress callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    /// Text added by this chunk (empty for a bare terminal object)
    pub delta: String,

    /// Everything received so far
    pub accumulated: String,

    /// Set on the terminal chunk
    pub is_final: bool,

    /// Set on the first chunk of a fallback attempt after an earlier model had already
    /// streamed text and then failed; `accumulated` starts over from this chunk
    pub restarted: bool,
}

/// Progress callback for streamed generation
pub type ProgressFn<'a> = dyn FnMut(&StreamChunk) + Send + 'a;

/// Progress information for model pull operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullProgress {
    /// Model name being pulled
    pub model: String,

    /// Current status message
    pub status: String,

    /// Layer digest, when the daemon reports one
    pub digest: Option<String>,

    /// Total bytes to download
    pub total: u64,

    /// Bytes downloaded so far
    pub completed: u64,
}

impl PullProgress {
    /// Get the progress percentage (0-100)
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.completed as f64 / self.total as f64) * 100.0
        }
    }

    /// True for the daemon's terminal `success` status
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Progress callback for model pulls
pub type PullProgressFn<'a> = dyn FnMut(&PullProgress) + Send + 'a;

/// Result of a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    /// The daemon reported `success` (or the stream ended cleanly)
    Completed,

    /// Non-streamed pull; carries the status the daemon returned
    Status(String),
}

/// Reachability of the daemon
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// Outcome of a health check. Never an error: failures show up as `Disconnected`.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub status: ConnectionStatus,

    /// Models listed by the check (empty when disconnected)
    pub models: Vec<ModelDescriptor>,

    /// Why the check failed, if it did
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}
