use thiserror::Error;

/// How much of the offending input is kept on the error for context.
const SNIPPET_LEN: usize = 80;

/// Structured failure surfaced when a buffer cannot be parsed or recovered.
///
/// Parsing incompleteness is *not* an error (the parser returns
/// [`crate::ParseOutcome::Pending`] for that); this type is reserved for
/// terminal conditions: end-of-stream on a hopeless buffer, a blown buffer
/// cap, or I/O trouble in the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    /// Truncated slice of the input that failed.
    pub input: String,
    /// Name of the last recovery strategy attempted, if any ran.
    pub strategy: Option<&'static str>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, input: &str) -> Self {
        Self {
            message: message.into(),
            input: snippet(input),
            strategy: None,
        }
    }

    pub fn with_strategy(message: impl Into<String>, input: &str, strategy: &'static str) -> Self {
        Self {
            message: message.into(),
            input: snippet(input),
            strategy: Some(strategy),
        }
    }

    pub fn from_serde(what: &str, input: &str, err: serde_json::Error) -> Self {
        Self::new(format!("{what}: {err}"), input)
    }
}

fn snippet(input: &str) -> String {
    if input.len() <= SNIPPET_LEN {
        return input.to_string();
    }
    let mut end = SNIPPET_LEN;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    input[..end].to_string()
}
