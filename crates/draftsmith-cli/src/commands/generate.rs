//! Generate command - run one generation through the orchestrator

use std::io::Write;

use draftsmith_content::{ContentType, GenerationRequest};
use draftsmith_ollama::{InferenceError, SamplingParams, StreamChunk};

use crate::commands::{cancel_on_ctrl_c, AppContext, Command};
use crate::error::{CliError, CliResult};
use crate::output::OutputStyle;
use crate::progress::create_spinner;

/// Sampling values given on the command line; unset ones keep their defaults
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SamplingOverrides {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub repeat_penalty: Option<f32>,
}

impl SamplingOverrides {
    pub fn apply(&self, mut sampling: SamplingParams) -> SamplingParams {
        if let Some(temperature) = self.temperature {
            sampling.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            sampling.max_tokens = max_tokens;
        }
        if let Some(top_p) = self.top_p {
            sampling.top_p = top_p;
        }
        if let Some(repeat_penalty) = self.repeat_penalty {
            sampling.repeat_penalty = repeat_penalty;
        }
        sampling
    }
}

/// Writes streamed deltas as they arrive
///
/// When a fallback attempt restarts the text, the output moves to a fresh line so the
/// failed model's fragment is not run together with the new text.
pub struct StreamPrinter<W> {
    out: W,
    printed_any: bool,
}

impl<W: Write> StreamPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            printed_any: false,
        }
    }

    /// Print one chunk; returns true when it discarded earlier output
    pub fn print(&mut self, chunk: &StreamChunk) -> bool {
        let restarted = chunk.restarted && self.printed_any;
        // Broken pipes surface again on the final newline
        if restarted {
            let _ = self.out.write_all(b"\n");
            self.printed_any = false;
        }
        if !chunk.delta.is_empty() {
            let _ = self.out.write_all(chunk.delta.as_bytes());
            let _ = self.out.flush();
            self.printed_any = true;
        }
        restarted
    }

    /// True when the current attempt has printed text
    pub fn printed_any(&self) -> bool {
        self.printed_any
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Generate command handler
pub struct GenerateCommand {
    context: AppContext,
    prompt: String,
    content_type: ContentType,
    stream: bool,
    fallback: Option<Vec<String>>,
    sampling: SamplingOverrides,
    save: bool,
}

impl GenerateCommand {
    pub fn new(context: AppContext, prompt: String) -> Self {
        Self {
            context,
            prompt,
            content_type: ContentType::General,
            stream: false,
            fallback: None,
            sampling: SamplingOverrides::default(),
            save: true,
        }
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_fallback(mut self, fallback: Option<Vec<String>>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_sampling_overrides(mut self, sampling: SamplingOverrides) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }

    /// The request this command submits
    pub fn build_request(&self) -> GenerationRequest {
        let mut request = GenerationRequest::new(self.prompt.clone())
            .with_content_type(self.content_type);
        request.sampling = self.sampling.apply(request.sampling);
        request.metadata = serde_json::json!({ "source": "cli" });
        if self.stream {
            request = request.with_streaming(true);
        }
        if let Some(fallback) = &self.fallback {
            request = request.with_fallback_models(fallback.clone());
        }
        if !self.save {
            request = request.without_persistence();
        }
        request
    }

    fn streaming(&self) -> bool {
        self.stream || self.context.client.config().streaming_enabled
    }
}

#[async_trait::async_trait]
impl Command for GenerateCommand {
    async fn execute(&self) -> CliResult<()> {
        let orchestrator = self.context.orchestrator(self.save)?;
        let (cancel, ctrl_c) = cancel_on_ctrl_c();
        let mut request = self.build_request();
        request.cancel = cancel;

        let streaming = self.streaming();
        let spinner = (!streaming && !self.context.quiet).then(|| create_spinner("Generating..."));

        let mut printer = StreamPrinter::new(std::io::stdout());
        let mut on_chunk = |chunk: &StreamChunk| {
            if printer.print(chunk) {
                eprintln!(
                    "{}",
                    OutputStyle::default()
                        .warning("Model failed mid-stream; restarting with the next model")
                );
            }
        };

        let result = orchestrator
            .generate_content(&self.context.user_id, request, Some(&mut on_chunk))
            .await;
        ctrl_c.abort();
        let printed_any = printer.printed_any();
        if let Some(spinner) = &spinner {
            spinner.finish_and_clear();
        }

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) if e.inference_error() == Some(&InferenceError::Cancelled) => {
                if printed_any {
                    println!();
                }
                if let Some(warning) = e.persistence_warning() {
                    eprintln!("{}", OutputStyle::default().warning(warning));
                }
                return Err(CliError::Interrupted);
            }
            Err(e) => {
                if printed_any {
                    println!();
                }
                return Err(e.into());
            }
        };

        if printed_any {
            println!();
        } else {
            println!("{}", outcome.content);
        }

        if self.context.quiet {
            return Ok(());
        }

        let style = OutputStyle::default();
        if outcome.fallback_used {
            eprintln!(
                "{}",
                style.warning(&format!(
                    "'{}' failed; generated with '{}'",
                    outcome.requested_model, outcome.model
                ))
            );
            for attempt in &outcome.failed_attempts {
                eprintln!("    {}: {}", attempt.model, attempt.error);
            }
        }
        if let Some(warning) = &outcome.persistence_warning {
            eprintln!("{}", style.warning(warning));
        }
        if let Some(record) = &outcome.record {
            eprintln!(
                "{}",
                style.info(&format!(
                    "Saved as {} ({} ms)",
                    record.id, record.generation_time_ms
                ))
            );
        }
        Ok(())
    }
}
