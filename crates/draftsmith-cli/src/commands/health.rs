//! Health command - check the daemon

use draftsmith_ollama::InferenceError;

use crate::commands::{AppContext, Command};
use crate::error::CliResult;
use crate::output::OutputStyle;

pub struct HealthCommand {
    context: AppContext,
}

impl HealthCommand {
    pub fn new(context: AppContext) -> Self {
        Self { context }
    }
}

#[async_trait::async_trait]
impl Command for HealthCommand {
    async fn execute(&self) -> CliResult<()> {
        let report = self.context.client.check_health_with_retry().await;

        if let Some(error) = &report.error {
            return Err(InferenceError::Network(error.clone()).into());
        }

        let style = OutputStyle::default();
        println!("{}", style.health(&report));
        if !self.context.quiet {
            println!("{}", style.key_value("Endpoint", self.context.client.base_url()));
            println!(
                "{}",
                style.key_value("Default model", &self.context.client.config().default_model)
            );
            let installed = report
                .models
                .iter()
                .any(|m| m.name == self.context.client.config().default_model);
            if !installed {
                println!(
                    "{}",
                    style.warning("The default model is not installed; generation will fall back")
                );
            }
        }
        Ok(())
    }
}
