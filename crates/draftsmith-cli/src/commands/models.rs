//! Models command - list, show, pull and delete models

use draftsmith_ollama::{PullOutcome, PullProgress};
use tracing::info;

use crate::commands::{cancel_on_ctrl_c, AppContext, Command};
use crate::error::{CliError, CliResult};
use crate::output::{self, OutputStyle};
use crate::progress::PullProgressBar;

/// Models command action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelsAction {
    List,
    Show { name: String },
    Pull { name: String },
    Delete { name: String },
}

/// Models command handler
pub struct ModelsCommand {
    context: AppContext,
    action: ModelsAction,
}

impl ModelsCommand {
    pub fn new(context: AppContext, action: ModelsAction) -> Self {
        Self { context, action }
    }

    async fn list(&self) -> CliResult<()> {
        let models = self.context.client.list_models().await?;
        if models.is_empty() {
            output::print_info("No models installed. Pull one with 'draftsmith pull llama2'.");
            return Ok(());
        }
        println!("{}", OutputStyle::default().model_table(&models));
        Ok(())
    }

    async fn show(&self, name: &str) -> CliResult<()> {
        let info = self.context.client.get_model_info(name).await?;
        let rendered = serde_json::to_string_pretty(&info)
            .map_err(|e| CliError::Config(format!("unprintable model info: {}", e)))?;
        println!("{}", rendered);
        Ok(())
    }

    async fn pull(&self, name: &str) -> CliResult<()> {
        let (cancel, ctrl_c) = cancel_on_ctrl_c();

        let result = if self.context.quiet {
            self.context.client.pull_model(name, None, &cancel).await
        } else {
            let mut bar = PullProgressBar::new(name);
            let mut on_progress = |progress: &PullProgress| bar.update(progress);
            let result = self
                .context
                .client
                .pull_model(name, Some(&mut on_progress), &cancel)
                .await;
            match &result {
                Ok(_) => bar.finish(&format!("Pulled {}", name)),
                Err(_) => bar.abandon(),
            }
            result
        };
        ctrl_c.abort();

        match result? {
            PullOutcome::Completed => {
                info!("Pulled model {}", name);
                output::print_success(&format!("Model '{}' is ready", name));
            }
            PullOutcome::Status(status) => {
                output::print_info(&format!("Pull of '{}' reported: {}", name, status));
            }
        }
        Ok(())
    }

    async fn delete(&self, name: &str) -> CliResult<()> {
        self.context.client.delete_model(name).await?;
        output::print_success(&format!("Deleted model '{}'", name));
        Ok(())
    }
}

#[async_trait::async_trait]
impl Command for ModelsCommand {
    async fn execute(&self) -> CliResult<()> {
        match &self.action {
            ModelsAction::List => self.list().await,
            ModelsAction::Show { name } => self.show(name).await,
            ModelsAction::Pull { name } => self.pull(name).await,
            ModelsAction::Delete { name } => self.delete(name).await,
        }
    }
}
