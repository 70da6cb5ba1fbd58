//! History command - recorded generations and their statistics

use draftsmith_content::{ContentType, GenerationFilter, GenerationStatus, StatsTimeframe};

use crate::commands::{AppContext, Command};
use crate::error::CliResult;
use crate::output::{self, OutputStyle};

/// History command action
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryAction {
    List {
        content_type: Option<ContentType>,
        status: Option<GenerationStatus>,
        limit: usize,
        offset: usize,
    },
    Stats {
        timeframe: StatsTimeframe,
    },
}

/// History command handler
pub struct HistoryCommand {
    context: AppContext,
    action: HistoryAction,
}

impl HistoryCommand {
    pub fn new(context: AppContext, action: HistoryAction) -> Self {
        Self { context, action }
    }

    async fn list(&self, filter: &GenerationFilter) -> CliResult<()> {
        let orchestrator = self.context.orchestrator(true)?;
        let records = orchestrator.history(&self.context.user_id, filter).await?;

        if records.is_empty() {
            output::print_info(&format!(
                "No generations recorded for '{}'",
                self.context.user_id
            ));
            return Ok(());
        }

        let style = OutputStyle::default();
        for record in &records {
            println!("{}", style.record_line(record));
        }
        Ok(())
    }

    async fn stats(&self, timeframe: StatsTimeframe) -> CliResult<()> {
        let orchestrator = self.context.orchestrator(true)?;
        let stats = orchestrator.stats(&self.context.user_id, timeframe).await?;

        let style = OutputStyle::default();
        if !self.context.quiet {
            println!(
                "{}",
                style.section(&format!(
                    "Generations for '{}' over the last {} days",
                    self.context.user_id,
                    timeframe.days()
                ))
            );
        }
        println!("{}", style.stats(&stats));
        Ok(())
    }
}

#[async_trait::async_trait]
impl Command for HistoryCommand {
    async fn execute(&self) -> CliResult<()> {
        match &self.action {
            HistoryAction::List {
                content_type,
                status,
                limit,
                offset,
            } => {
                let filter = GenerationFilter {
                    content_type: *content_type,
                    status: *status,
                    created_after: None,
                    limit: *limit,
                    offset: *offset,
                };
                self.list(&filter).await
            }
            HistoryAction::Stats { timeframe } => self.stats(*timeframe).await,
        }
    }
}
