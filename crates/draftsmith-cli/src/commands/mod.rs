// Command handlers for the draftsmith CLI

pub mod generate;
pub mod health;
pub mod history;
pub mod models;

pub use generate::{GenerateCommand, SamplingOverrides, StreamPrinter};
pub use health::HealthCommand;
pub use history::{HistoryAction, HistoryCommand};
pub use models::{ModelsAction, ModelsCommand};

use std::path::PathBuf;
use std::sync::Arc;

use draftsmith_content::{
    GenerationOrchestrator, GenerationStore, InMemoryGenerationStore, JsonFileGenerationStore,
};
use draftsmith_ollama::{CancellationToken, OllamaClient, OllamaConfig};
use tracing::debug;

use crate::error::{CliError, CliResult};
use crate::router::Cli;

/// Trait for command handlers
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command
    async fn execute(&self) -> CliResult<()>;
}

/// Shared state every command is built from
#[derive(Debug, Clone)]
pub struct AppContext {
    pub client: OllamaClient,
    pub user_id: String,
    pub records_path: PathBuf,
    pub quiet: bool,
}

impl AppContext {
    /// Load configuration and apply the global flag overrides
    pub fn from_cli(cli: &Cli) -> CliResult<Self> {
        let mut config = OllamaConfig::load_with_precedence()?;
        if let Some(base_url) = &cli.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(model) = &cli.model {
            config.default_model = model.clone();
        }

        let records_path = match &cli.records {
            Some(path) => path.clone(),
            None => default_records_path()?,
        };
        debug!("Using generation records at {}", records_path.display());

        Ok(Self {
            client: OllamaClient::new(config)?,
            user_id: cli.user.clone(),
            records_path,
            quiet: cli.quiet,
        })
    }

    /// Orchestrator over the records file, or over a throwaway store when nothing is saved
    pub fn orchestrator(&self, persist: bool) -> CliResult<GenerationOrchestrator> {
        let store: Arc<dyn GenerationStore> = if persist {
            Arc::new(JsonFileGenerationStore::open(&self.records_path)?)
        } else {
            Arc::new(InMemoryGenerationStore::new())
        };
        Ok(GenerationOrchestrator::new(
            Arc::new(self.client.clone()),
            store,
        ))
    }
}

/// `<data dir>/draftsmith/generations.json`
pub fn default_records_path() -> CliResult<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("draftsmith").join("generations.json"))
        .ok_or_else(|| {
            CliError::Config("could not determine a data directory; pass --records".to_string())
        })
}

/// A token cancelled on Ctrl-C; abort the returned handle once the work is done
pub fn cancel_on_ctrl_c() -> (CancellationToken, tokio::task::JoinHandle<()>) {
    let token = CancellationToken::new();
    let child = token.clone();
    let handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Ctrl-C received, cancelling");
            child.cancel();
        }
    });
    (token, handle)
}
