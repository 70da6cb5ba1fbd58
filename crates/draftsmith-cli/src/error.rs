// CLI error type and user-facing messages

use draftsmith_content::{GenerationError, PersistenceError};
use draftsmith_ollama::InferenceError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Storage error: {0}")]
    Storage(#[from] PersistenceError),

    #[error("Interrupted")]
    Interrupted,
}

impl CliError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CliError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!(
                    "Invalid argument: {}\n\nRun 'draftsmith --help' for usage information.",
                    message
                )
            }
            CliError::Io(e) => format!("File operation failed: {}", e),
            CliError::Config(msg) | CliError::Inference(InferenceError::Config(msg)) => format!(
                "Configuration error: {}\n\nCheck ~/.draftsmith/config.yaml and the OLLAMA_* environment variables.",
                msg
            ),
            CliError::Inference(e) => inference_message(e),
            CliError::Generation(GenerationError::Inference(e)) => inference_message(e),
            CliError::Generation(GenerationError::Unrecorded { error, warning }) => {
                format!("{}\n\nWarning: {}", inference_message(error), warning)
            }
            CliError::Generation(GenerationError::InvalidRequest(msg)) => {
                format!("Invalid request: {}", msg)
            }
            CliError::Generation(GenerationError::Persistence(e)) | CliError::Storage(e) => {
                format!(
                    "Storage error: {}\n\nUse --records to choose another history file, or --no-save to skip it.",
                    e
                )
            }
            CliError::Interrupted => "Cancelled.".to_string(),
        }
    }

    /// Get technical details for verbose mode
    pub fn technical_details(&self) -> String {
        format!("{:?}", self)
    }
}

fn inference_message(err: &InferenceError) -> String {
    match err {
        e if e.is_transport() => format!(
            "Cannot reach Ollama: {}\n\nIs the daemon running? Start it with 'ollama serve'.",
            e
        ),
        InferenceError::ModelNotFound(model) => format!(
            "Model '{}' is not installed.\n\nPull it with 'draftsmith pull {}'.",
            model, model
        ),
        InferenceError::AllModelsFailed { attempts } => {
            let mut message = String::from("Every model failed:");
            for attempt in attempts {
                message.push_str(&format!("\n  • {}: {}", attempt.model, attempt.error));
            }
            message
        }
        InferenceError::Cancelled => "Cancelled.".to_string(),
        e => format!("Inference error: {}", e),
    }
}

pub type CliResult<T> = Result<T, CliError>;
