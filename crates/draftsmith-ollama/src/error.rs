//! Error types for inference operations

use thiserror::Error;

/// A single failed model attempt during fallback generation
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAttempt {
    /// Model that was tried
    pub model: String,

    /// Why it failed
    pub error: InferenceError,
}

/// Errors that can occur while talking to the inference daemon
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    /// Connection refused, DNS failure, reset connection
    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// The daemon answered outside the 2xx range
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The top-level response body was not the JSON we expected
    #[error("Parse error: {0}")]
    Parse(String),

    /// The body stream broke after some text was already produced
    #[error("Stream interrupted after {} bytes: {reason}", .partial.len())]
    StreamInterrupted { partial: String, reason: String },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid model name: {0}")]
    InvalidModelName(String),

    /// A sampling parameter is outside its accepted range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,

    /// Every model in the fallback plan failed
    #[error("All models failed ({})", .attempts.iter().map(|a| a.model.as_str()).collect::<Vec<_>>().join(", "))]
    AllModelsFailed { attempts: Vec<ModelAttempt> },
}

impl InferenceError {
    /// True when the daemon itself could not be reached (as opposed to a model-level failure)
    pub fn is_transport(&self) -> bool {
        matches!(self, InferenceError::Network(_) | InferenceError::Timeout(_))
    }

    /// Names of the models attempted, in order, for an exhausted fallback plan
    pub fn models_attempted(&self) -> Vec<String> {
        match self {
            InferenceError::AllModelsFailed { attempts } => {
                attempts.iter().map(|a| a.model.clone()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Text produced before a stream broke; for an exhausted plan, from the last
    /// attempt that produced any
    pub fn partial_content(&self) -> Option<&str> {
        match self {
            InferenceError::StreamInterrupted { partial, .. } if !partial.is_empty() => {
                Some(partial)
            }
            InferenceError::AllModelsFailed { attempts } => attempts
                .iter()
                .rev()
                .find_map(|a| a.error.partial_content()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            InferenceError::Timeout(err.to_string())
        } else if err.is_decode() {
            InferenceError::Parse(err.to_string())
        } else {
            InferenceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for InferenceError {
    fn from(err: serde_json::Error) -> Self {
        InferenceError::Parse(err.to_string())
    }
}
