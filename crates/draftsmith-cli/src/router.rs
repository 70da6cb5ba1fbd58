// Command routing and dispatch

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use draftsmith_content::{ContentType, GenerationStatus, StatsTimeframe};

use crate::commands::*;
use crate::error::CliResult;

/// Draftsmith - content generation on a local Ollama daemon
#[derive(Parser, Debug)]
#[command(name = "draftsmith")]
#[command(bin_name = "draftsmith")]
#[command(about = "Generate content with local models served by Ollama")]
#[command(
    long_about = "Draftsmith: content generation on a local Ollama daemon.\n\nGenerations fall back across models when one fails, can stream as they are\nproduced, and are recorded so history and statistics survive between runs.\n\nConfiguration: ~/.draftsmith/config.yaml, ./.draftsmith/config.yaml and the\nOLLAMA_* environment variables, in increasing priority."
)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimize output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Ollama base URL (overrides configuration)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Default model (overrides configuration)
    #[arg(long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// User the generation records belong to
    #[arg(long, global = true, default_value = "local")]
    pub user: String,

    /// Generation records file
    #[arg(long, global = true, value_name = "PATH")]
    pub records: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Check that the daemon is reachable
    #[command(about = "Check that the Ollama daemon is reachable")]
    Health,

    /// List installed models
    #[command(about = "List models installed on the daemon")]
    Models,

    /// Show model details
    #[command(about = "Show details for an installed model")]
    Show {
        #[arg(value_name = "MODEL")]
        name: String,
    },

    /// Download a model
    #[command(about = "Pull a model from the registry")]
    Pull {
        #[arg(value_name = "MODEL")]
        name: String,
    },

    /// Remove a model
    #[command(about = "Delete an installed model")]
    Delete {
        #[arg(value_name = "MODEL")]
        name: String,
    },

    /// Generate content from a prompt
    #[command(about = "Generate content from a prompt, falling back across models")]
    Generate {
        #[arg(value_name = "PROMPT")]
        prompt: String,

        /// Content type (blog, social, product, general)
        #[arg(short = 't', long = "type", default_value = "general")]
        content_type: ContentType,

        /// Print the content as it is generated
        #[arg(short, long)]
        stream: bool,

        /// Fallback models, comma separated (default: configured list)
        #[arg(long, value_delimiter = ',', value_name = "MODELS")]
        fallback: Option<Vec<String>>,

        #[arg(long)]
        temperature: Option<f32>,

        #[arg(long)]
        max_tokens: Option<u32>,

        #[arg(long)]
        top_p: Option<f32>,

        #[arg(long)]
        repeat_penalty: Option<f32>,

        /// Do not record this generation
        #[arg(long)]
        no_save: bool,
    },

    /// Show recorded generations
    #[command(about = "Show recorded generations, most recent first")]
    History {
        #[arg(short = 't', long = "type")]
        content_type: Option<ContentType>,

        /// pending, generating, completed or failed
        #[arg(long)]
        status: Option<GenerationStatus>,

        #[arg(long, default_value_t = 50)]
        limit: usize,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Summarize recorded generations
    #[command(about = "Summarize recorded generations over a time window")]
    Stats {
        /// 7d, 30d or 90d
        #[arg(long, default_value = "30d")]
        timeframe: StatsTimeframe,
    },
}

/// Command router
pub struct CommandRouter;

impl CommandRouter {
    /// Parse CLI arguments and route to appropriate handler
    pub async fn route() -> CliResult<()> {
        let cli = Cli::parse();

        // Initialize logging based on CLI flags
        crate::logging::init_logging(cli.verbose, cli.quiet);

        Self::execute(&cli).await
    }

    /// Execute a command
    pub async fn execute(cli: &Cli) -> CliResult<()> {
        let context = AppContext::from_cli(cli)?;

        match &cli.command {
            Commands::Health => HealthCommand::new(context).execute().await,
            Commands::Models => ModelsCommand::new(context, ModelsAction::List).execute().await,
            Commands::Show { name } => {
                ModelsCommand::new(context, ModelsAction::Show { name: name.clone() })
                    .execute()
                    .await
            }
            Commands::Pull { name } => {
                ModelsCommand::new(context, ModelsAction::Pull { name: name.clone() })
                    .execute()
                    .await
            }
            Commands::Delete { name } => {
                ModelsCommand::new(context, ModelsAction::Delete { name: name.clone() })
                    .execute()
                    .await
            }
            Commands::Generate {
                prompt,
                content_type,
                stream,
                fallback,
                temperature,
                max_tokens,
                top_p,
                repeat_penalty,
                no_save,
            } => {
                let cmd = GenerateCommand::new(context, prompt.clone())
                    .with_content_type(*content_type)
                    .with_stream(*stream)
                    .with_fallback(fallback.clone())
                    .with_sampling_overrides(SamplingOverrides {
                        temperature: *temperature,
                        max_tokens: *max_tokens,
                        top_p: *top_p,
                        repeat_penalty: *repeat_penalty,
                    })
                    .with_save(!*no_save);
                cmd.execute().await
            }
            Commands::History {
                content_type,
                status,
                limit,
                offset,
            } => {
                let action = HistoryAction::List {
                    content_type: *content_type,
                    status: *status,
                    limit: *limit,
                    offset: *offset,
                };
                HistoryCommand::new(context, action).execute().await
            }
            Commands::Stats { timeframe } => {
                HistoryCommand::new(context, HistoryAction::Stats { timeframe: *timeframe })
                    .execute()
                    .await
            }
        }
    }
}
