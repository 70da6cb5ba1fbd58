//! Argument parsing, error messages and command execution against a mock daemon

use clap::Parser;
use draftsmith_cli::commands::{GenerateCommand, SamplingOverrides, StreamPrinter};
use draftsmith_cli::output::{excerpt, OutputStyle};
use draftsmith_cli::{AppContext, Cli, CliError, CommandRouter, Commands};
use draftsmith_content::{
    ContentType, GenerationError, GenerationFilter, GenerationStatus, GenerationStore,
    JsonFileGenerationStore, StatsTimeframe,
};
use draftsmith_ollama::{InferenceError, ModelAttempt, SamplingParams, StreamChunk};
use mockito::{Matcher, Server};
use serde_json::json;
use tempfile::TempDir;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("draftsmith").chain(args.iter().copied())).unwrap()
}

// ============================================================================
// Argument Parsing
// ============================================================================

#[test]
fn test_global_flags_defaults() {
    let cli = parse(&["health"]);
    assert!(matches!(cli.command, Commands::Health));
    assert_eq!(cli.user, "local");
    assert!(cli.base_url.is_none());
    assert!(cli.records.is_none());
    assert!(!cli.verbose);
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&["models", "--base-url", "http://gpu-box:11434", "-v", "--user", "ana"]);
    assert_eq!(cli.base_url.as_deref(), Some("http://gpu-box:11434"));
    assert_eq!(cli.user, "ana");
    assert!(cli.verbose);
}

#[test]
fn test_generate_arguments() {
    let cli = parse(&[
        "generate",
        "Write a haiku",
        "--type",
        "social",
        "--stream",
        "--fallback",
        "mistral,phi",
        "--temperature",
        "0.2",
        "--max-tokens",
        "64",
        "--no-save",
    ]);

    match cli.command {
        Commands::Generate {
            prompt,
            content_type,
            stream,
            fallback,
            temperature,
            max_tokens,
            top_p,
            no_save,
            ..
        } => {
            assert_eq!(prompt, "Write a haiku");
            assert_eq!(content_type, ContentType::Social);
            assert!(stream);
            assert_eq!(
                fallback,
                Some(vec!["mistral".to_string(), "phi".to_string()])
            );
            assert_eq!(temperature, Some(0.2));
            assert_eq!(max_tokens, Some(64));
            assert_eq!(top_p, None);
            assert!(no_save);
        }
        other => panic!("Expected Generate, got {:?}", other),
    }
}

#[test]
fn test_generate_defaults_to_general_content() {
    match parse(&["generate", "hi"]).command {
        Commands::Generate {
            content_type,
            stream,
            fallback,
            no_save,
            ..
        } => {
            assert_eq!(content_type, ContentType::General);
            assert!(!stream);
            assert!(fallback.is_none());
            assert!(!no_save);
        }
        other => panic!("Expected Generate, got {:?}", other),
    }
}

#[test]
fn test_history_and_stats_arguments() {
    match parse(&["history", "--status", "failed", "--limit", "5", "--offset", "10"]).command {
        Commands::History {
            content_type,
            status,
            limit,
            offset,
        } => {
            assert_eq!(content_type, None);
            assert_eq!(status, Some(GenerationStatus::Failed));
            assert_eq!((limit, offset), (5, 10));
        }
        other => panic!("Expected History, got {:?}", other),
    }

    match parse(&["stats"]).command {
        Commands::Stats { timeframe } => assert_eq!(timeframe, StatsTimeframe::Month),
        other => panic!("Expected Stats, got {:?}", other),
    }
    match parse(&["stats", "--timeframe", "7d"]).command {
        Commands::Stats { timeframe } => assert_eq!(timeframe, StatsTimeframe::Week),
        other => panic!("Expected Stats, got {:?}", other),
    }
}

#[test]
fn test_invalid_arguments_rejected() {
    assert!(Cli::try_parse_from(["draftsmith", "generate", "x", "--type", "poem"]).is_err());
    assert!(Cli::try_parse_from(["draftsmith", "stats", "--timeframe", "1y"]).is_err());
    assert!(Cli::try_parse_from(["draftsmith", "history", "--status", "done"]).is_err());
    assert!(Cli::try_parse_from(["draftsmith"]).is_err());
}

// ============================================================================
// Request Building
// ============================================================================

#[test]
fn test_sampling_overrides_keep_unset_defaults() {
    let overrides = SamplingOverrides {
        temperature: Some(0.1),
        repeat_penalty: Some(1.3),
        ..SamplingOverrides::default()
    };
    let defaults = SamplingParams::default();
    let applied = overrides.apply(defaults);

    assert_eq!(applied.temperature, 0.1);
    assert_eq!(applied.repeat_penalty, 1.3);
    assert_eq!(applied.max_tokens, defaults.max_tokens);
    assert_eq!(applied.top_p, defaults.top_p);
}

#[test]
fn test_generate_command_builds_request() {
    let dir = TempDir::new().unwrap();
    let cli = parse(&[
        "--records",
        dir.path().join("g.json").to_str().unwrap(),
        "health",
    ]);
    let context = AppContext::from_cli(&cli).unwrap();

    let request = GenerateCommand::new(context, "Describe a kettle".to_string())
        .with_content_type(ContentType::Product)
        .with_fallback(Some(vec!["phi".to_string()]))
        .with_save(false)
        .build_request();

    assert_eq!(request.prompt, "Describe a kettle");
    assert_eq!(request.content_type, ContentType::Product);
    assert_eq!(request.fallback_models, vec!["phi".to_string()]);
    assert_eq!(request.streaming, None);
    assert!(!request.persist);
    assert_eq!(request.metadata["source"], "cli");
}

// ============================================================================
// Error Messages
// ============================================================================

#[test]
fn test_user_message_for_unreachable_daemon() {
    let err = CliError::from(InferenceError::Network("connection refused".to_string()));
    let message = err.user_message();
    assert!(message.contains("connection refused"));
    assert!(message.contains("ollama serve"));
}

#[test]
fn test_user_message_for_missing_model() {
    let err = CliError::from(InferenceError::ModelNotFound("phi".to_string()));
    assert!(err.user_message().contains("draftsmith pull phi"));
}

#[test]
fn test_user_message_lists_every_failed_model() {
    let err = CliError::from(InferenceError::AllModelsFailed {
        attempts: vec![
            ModelAttempt {
                model: "llama2".to_string(),
                error: InferenceError::ModelNotFound("llama2".to_string()),
            },
            ModelAttempt {
                model: "mistral".to_string(),
                error: InferenceError::Timeout("no response".to_string()),
            },
        ],
    });
    let message = err.user_message();
    assert!(message.contains("llama2"));
    assert!(message.contains("mistral"));
    assert!(!message.contains("ollama serve"));
}

#[test]
fn test_user_message_for_unrecorded_failure() {
    let err = CliError::from(GenerationError::Unrecorded {
        error: InferenceError::ModelNotFound("phi".to_string()),
        warning: "generation record g1 was not finalized: disk full".to_string(),
    });
    let message = err.user_message();
    assert!(message.contains("draftsmith pull phi"));
    assert!(message.contains("disk full"));
}

// ============================================================================
// Output Formatting
// ============================================================================

#[test]
fn test_plain_output_style() {
    let style = OutputStyle::plain();
    assert_eq!(style.success("done"), "✓ done");
    assert_eq!(style.error("failed"), "✗ failed");
    assert_eq!(style.key_value("Total", "3"), "  Total: 3");
    assert_eq!(style.status(GenerationStatus::Completed), "completed");
}

fn chunk(delta: &str, accumulated: &str, restarted: bool) -> StreamChunk {
    StreamChunk {
        delta: delta.to_string(),
        accumulated: accumulated.to_string(),
        is_final: false,
        restarted,
    }
}

#[test]
fn test_stream_printer_breaks_line_on_fallback_restart() {
    let mut printer = StreamPrinter::new(Vec::new());

    assert!(!printer.print(&chunk("Hel", "Hel", false)));
    assert!(printer.print(&chunk("Hi", "Hi", true)));
    assert!(!printer.print(&chunk("", "Hi", false)));
    assert!(printer.printed_any());

    let written = String::from_utf8(printer.into_inner()).unwrap();
    assert_eq!(written, "Hel\nHi");
    assert_eq!(written.lines().last(), Some("Hi"));
}

#[test]
fn test_stream_printer_ignores_restart_before_any_output() {
    let mut printer = StreamPrinter::new(Vec::new());
    assert!(!printer.print(&chunk("Hi", "Hi", true)));
    assert_eq!(String::from_utf8(printer.into_inner()).unwrap(), "Hi");
}

#[test]
fn test_excerpt() {
    assert_eq!(excerpt("short", 10), "short");
    assert_eq!(excerpt("line one\nline   two", 40), "line one line two");
    assert_eq!(excerpt("abcdefghij", 5), "abcd…");
}

// ============================================================================
// Command Execution
// ============================================================================

#[tokio::test]
async fn test_generate_then_history_against_mock_daemon() {
    let mut server = Server::new_async().await;
    let generate = server
        .mock("POST", "/api/generate")
        .match_body(Matcher::PartialJson(json!({
            "model": "mistral",
            "prompt": "Write a haiku",
            "options": {"temperature": 0.5}
        })))
        .with_status(200)
        .with_body(r#"{"model":"mistral","response":"Autumn moonlight","done":true}"#)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let records = dir.path().join("generations.json");
    let records_arg = records.to_str().unwrap();
    let base_url = server.url();

    let cli = parse(&[
        "--base-url",
        &base_url,
        "--model",
        "mistral",
        "--records",
        records_arg,
        "-q",
        "generate",
        "Write a haiku",
        "--type",
        "blog",
        "--temperature",
        "0.5",
    ]);
    CommandRouter::execute(&cli).await.unwrap();
    generate.assert_async().await;

    let store = JsonFileGenerationStore::open(&records).unwrap();
    let saved = store.list("local", &GenerationFilter::default()).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].status, GenerationStatus::Completed);
    assert_eq!(saved[0].generated_content.as_deref(), Some("Autumn moonlight"));
    assert_eq!(saved[0].content_type, ContentType::Blog);

    let history = parse(&["--records", records_arg, "-q", "history", "--type", "blog"]);
    CommandRouter::execute(&history).await.unwrap();
    let stats = parse(&["--records", records_arg, "-q", "stats", "--timeframe", "7d"]);
    CommandRouter::execute(&stats).await.unwrap();
}

#[tokio::test]
async fn test_generate_failure_is_recorded_and_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/generate")
        .with_status(500)
        .with_body(r#"{"error":"out of memory"}"#)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let records = dir.path().join("generations.json");
    let base_url = server.url();
    let cli = parse(&[
        "--base-url",
        &base_url,
        "--records",
        records.to_str().unwrap(),
        "-q",
        "generate",
        "Write a haiku",
        "--fallback",
        "mistral",
    ]);

    let err = CommandRouter::execute(&cli).await.unwrap_err();
    assert!(err.user_message().contains("out of memory"));

    let store = JsonFileGenerationStore::open(&records).unwrap();
    let saved = store.list("local", &GenerationFilter::default()).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].status, GenerationStatus::Failed);
}

#[tokio::test]
async fn test_health_reports_unreachable_daemon() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/tags")
        .with_status(503)
        .expect_at_least(1)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let base_url = server.url();
    let cli = parse(&[
        "--base-url",
        &base_url,
        "--records",
        dir.path().join("g.json").to_str().unwrap(),
        "health",
    ]);

    match CommandRouter::execute(&cli).await {
        Err(CliError::Inference(InferenceError::Network(_))) => {}
        other => panic!("Expected Network error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_missing_model() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", "/api/delete")
        .with_status(404)
        .with_body(r#"{"error":"model 'phi' not found"}"#)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let base_url = server.url();
    let cli = parse(&[
        "--base-url",
        &base_url,
        "--records",
        dir.path().join("g.json").to_str().unwrap(),
        "delete",
        "phi",
    ]);

    match CommandRouter::execute(&cli).await {
        Err(CliError::Inference(InferenceError::ModelNotFound(model))) => assert_eq!(model, "phi"),
        other => panic!("Expected ModelNotFound, got {:?}", other),
    }
}
