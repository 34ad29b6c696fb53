//! Chunk-wise streaming parse with strict-first, recover-second semantics.

use crate::error::ParseError;
use crate::options::Options;
use crate::recover::{recover_all, recover_fast};
use serde_json::Value;

/// Where the parser is between two `ingest` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// No buffered text, ready for a new value.
    Idle,
    /// Buffered text that neither parses strictly nor recovers yet. The
    /// expected steady state for most chunks.
    Parsing,
    /// The buffer recovered tentatively; more chunks may obsolete the salvage.
    Recovering,
    /// The last ingest produced a strictly valid value.
    Complete,
    /// The current value was abandoned (buffer cap blown or `finish` failed).
    Failed,
}

/// Best-effort snapshot produced by every `ingest` call. Value semantics:
/// each outcome owns its tree and never aliases a previous one.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The buffer is strictly valid JSON. Authoritative over any salvage.
    Complete { value: Value },
    /// A recovery strategy produced a tentative interpretation.
    Recovered { value: Value, strategy: &'static str },
    /// Not enough data yet. Not an error.
    Pending,
}

impl ParseOutcome {
    pub fn value(&self) -> Option<&Value> {
        match self {
            ParseOutcome::Complete { value } | ParseOutcome::Recovered { value, .. } => Some(value),
            ParseOutcome::Pending => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ParseOutcome::Complete { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ParseOutcome::Pending)
    }
}

/// Accepts successive raw text chunks and produces the best obtainable value
/// after each one, without waiting for a terminating signal.
pub struct StreamingParser {
    opts: Options,
    buf: String,
    state: ParseState,
}

impl StreamingParser {
    pub fn new(opts: Options) -> Self {
        Self {
            opts,
            buf: String::new(),
            state: ParseState::Idle,
        }
    }

    /// Append `chunk` and re-evaluate the buffer.
    ///
    /// Strict parse wins over recovery; a successful strict parse consumes
    /// the buffer so the next chunk starts a fresh value. A recovered result
    /// leaves the buffer in place since later chunks may complete it
    /// properly. Empty chunks are no-ops.
    pub fn ingest(&mut self, chunk: &str) -> ParseOutcome {
        if chunk.is_empty() {
            return ParseOutcome::Pending;
        }
        if matches!(self.state, ParseState::Complete | ParseState::Failed) {
            self.state = ParseState::Idle;
        }
        self.buf.push_str(chunk);
        if self.buf.len() > self.opts.max_buffer_bytes {
            self.buf.clear();
            self.state = ParseState::Failed;
            return ParseOutcome::Pending;
        }
        if self.buf.trim().is_empty() {
            return ParseOutcome::Pending;
        }
        if let Ok(value) = serde_json::from_str::<Value>(&self.buf) {
            self.buf.clear();
            self.state = ParseState::Complete;
            return ParseOutcome::Complete { value };
        }
        self.state = ParseState::Parsing;
        let res = if self.opts.exhaustive_recovery {
            recover_all(&self.buf, &self.opts)
        } else {
            recover_fast(&self.buf, &self.opts)
        };
        if res.success
            && let Some(value) = res.value
        {
            self.state = ParseState::Recovering;
            return ParseOutcome::Recovered {
                value,
                strategy: res.strategy,
            };
        }
        ParseOutcome::Pending
    }

    /// End-of-stream: settle whatever is buffered.
    ///
    /// An empty (or whitespace-only) buffer is `Ok(None)`. Otherwise strict
    /// parse, then the full recovery ladder; total failure is the one place
    /// the parser surfaces a structured error instead of `Pending`.
    pub fn finish(&mut self) -> Result<Option<Value>, ParseError> {
        if self.buf.trim().is_empty() {
            self.buf.clear();
            self.state = ParseState::Idle;
            return Ok(None);
        }
        if let Ok(value) = serde_json::from_str::<Value>(&self.buf) {
            self.buf.clear();
            self.state = ParseState::Complete;
            return Ok(Some(value));
        }
        let res = recover_all(&self.buf, &self.opts);
        if res.success
            && let Some(value) = res.value
        {
            self.buf.clear();
            self.state = ParseState::Complete;
            return Ok(Some(value));
        }
        let message = res
            .error
            .unwrap_or_else(|| "no recovery strategy succeeded".to_string());
        let err = ParseError::with_strategy(message, &self.buf, res.strategy);
        self.buf.clear();
        self.state = ParseState::Failed;
        Err(err)
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// The unconsumed raw text, for diagnostics.
    pub fn buffer(&self) -> &str {
        &self.buf
    }

    /// Discard all buffered text and return to `Idle`.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = ParseState::Idle;
    }
}
