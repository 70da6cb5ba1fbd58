//! Newline-delimited JSON parsing for streamed daemon responses
//!
//! The daemon streams `/api/generate` and `/api/pull` bodies as one JSON object per
//! line. Transport chunks do not respect line boundaries, so [`LineBuffer`] holds raw
//! bytes until a full line is available; the parsers then turn each line into a
//! caller-facing update. A line that is not valid JSON is logged and skipped.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::{
    error::InferenceError,
    models::{Generation, PullProgress, StreamChunk},
};

/// Buffers raw body bytes and yields complete, non-blank lines
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    /// Bytes of `pending` already known to hold no newline
    scanned: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transport chunk and drain every complete line
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        for i in self.scanned..self.pending.len() {
            if self.pending[i] == b'\n' {
                if let Some(line) = decode_line(&self.pending[start..i]) {
                    lines.push(line);
                }
                start = i + 1;
            }
        }
        self.pending.drain(..start);
        self.scanned = self.pending.len();
        lines
    }

    /// Whatever is left once the body has ended (a final line without newline)
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        self.scanned = 0;
        decode_line(&rest)
    }
}

fn decode_line(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// One object of a streamed `/api/generate` body
#[derive(Debug, Deserialize)]
struct GenerateLine {
    response: Option<String>,
    model: Option<String>,
    created_at: Option<String>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

/// Accumulates a streamed generation line by line
#[derive(Debug, Default)]
pub struct GenerationStream {
    accumulated: String,
    model: Option<String>,
    created_at: Option<DateTime<Utc>>,
    finished: bool,
}

impl GenerationStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one line and return the chunk to forward, if the line produced one.
    ///
    /// A `response` field appends to the accumulator; a terminal object without text
    /// still yields a final chunk. An in-band `error` object ends the stream with the
    /// partial text attached.
    pub fn feed_line(&mut self, line: &str) -> Result<Option<StreamChunk>, InferenceError> {
        let parsed: GenerateLine = match serde_json::from_str(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Skipping malformed stream line: {}", e);
                return Ok(None);
            }
        };

        if let Some(reason) = parsed.error {
            return Err(InferenceError::StreamInterrupted {
                partial: self.accumulated.clone(),
                reason,
            });
        }

        if let Some(model) = parsed.model {
            self.model = Some(model);
        }
        if let Some(created_at) = parsed.created_at.as_deref().and_then(parse_timestamp) {
            self.created_at = Some(created_at);
        }
        if parsed.done {
            self.finished = true;
        }

        match parsed.response {
            Some(delta) if !delta.is_empty() || parsed.done => {
                self.accumulated.push_str(&delta);
                Ok(Some(self.chunk(delta, parsed.done)))
            }
            None if parsed.done => Ok(Some(self.chunk(String::new(), true))),
            _ => Ok(None),
        }
    }

    /// Mark the stream as ended without a terminal object; returns the closing chunk
    pub fn close(&mut self) -> StreamChunk {
        self.finished = true;
        self.chunk(String::new(), true)
    }

    fn chunk(&self, delta: String, is_final: bool) -> StreamChunk {
        StreamChunk {
            delta,
            accumulated: self.accumulated.clone(),
            is_final,
            restarted: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// Build the final result; `requested_model` fills in when the daemon named none
    pub fn into_generation(self, requested_model: &str) -> Generation {
        Generation {
            content: self.accumulated,
            model: self.model.unwrap_or_else(|| requested_model.to_string()),
            created_at: self.created_at,
            done: true,
        }
    }
}

/// One object of a streamed `/api/pull` body
#[derive(Debug, Deserialize)]
struct PullLine {
    status: Option<String>,
    digest: Option<String>,
    total: Option<u64>,
    completed: Option<u64>,
    error: Option<String>,
}

/// Parses pull status lines into progress updates
#[derive(Debug)]
pub struct PullStream {
    model: String,
    succeeded: bool,
}

impl PullStream {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            succeeded: false,
        }
    }

    /// Parse one status line; malformed lines are skipped
    pub fn feed_line(&mut self, line: &str) -> Result<Option<PullProgress>, InferenceError> {
        let parsed: PullLine = match serde_json::from_str(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Skipping malformed pull progress line: {}", e);
                return Ok(None);
            }
        };

        if let Some(reason) = parsed.error {
            return Err(InferenceError::StreamInterrupted {
                partial: String::new(),
                reason,
            });
        }

        let Some(status) = parsed.status else {
            return Ok(None);
        };

        let progress = PullProgress {
            model: self.model.clone(),
            status,
            digest: parsed.digest,
            total: parsed.total.unwrap_or(0),
            completed: parsed.completed.unwrap_or(0),
        };
        if progress.is_success() {
            self.succeeded = true;
        }
        Ok(Some(progress))
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
