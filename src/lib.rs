mod classify;
pub mod cli;
mod component;
pub mod error;
pub mod options;
pub mod parser;
pub mod recover;
pub mod renderer;

pub use component::{ComponentShape, component_id, shallow_merge};
pub use error::ParseError;
pub use options::Options;
pub use parser::{ParseOutcome, ParseState, StreamingParser};
pub use recover::{
    RecoveryLogEntry, RecoveryResult, RecoveryStats, recover_all, recover_all_with_log,
    recover_fast, recover_fast_with_log, recovery_stats,
};
pub use renderer::{
    ComponentState, ComponentStatus, IncrementalRenderer, RenderCallbacks, RenderMetrics,
};

use serde_json::Value;

/// Repair a potentially malformed JSON string into a valid JSON string.
/// Already-valid input is returned unchanged.
pub fn recover_to_string(input: &str, opts: &Options) -> Result<String, ParseError> {
    if serde_json::from_str::<Value>(input).is_ok() {
        return Ok(input.to_string());
    }
    let res = if opts.exhaustive_recovery {
        recover_all(input, opts)
    } else {
        recover_fast(input, opts)
    };
    match res.recovered {
        Some(s) if res.success => Ok(s),
        _ => Err(ParseError::with_strategy(
            res.error
                .unwrap_or_else(|| "no recovery strategy succeeded".to_string()),
            input,
            res.strategy,
        )),
    }
}

/// Repair and parse into a `serde_json::Value`.
pub fn recover_to_value(input: &str, opts: &Options) -> Result<Value, ParseError> {
    if let Ok(v) = serde_json::from_str::<Value>(input) {
        return Ok(v);
    }
    let res = if opts.exhaustive_recovery {
        recover_all(input, opts)
    } else {
        recover_fast(input, opts)
    };
    match res.value {
        Some(v) if res.success => Ok(v),
        _ => Err(ParseError::with_strategy(
            res.error
                .unwrap_or_else(|| "no recovery strategy succeeded".to_string()),
            input,
            res.strategy,
        )),
    }
}

/// Convenience: feed a sequence of chunks through a fresh [`StreamingParser`]
/// and collect every non-pending outcome in arrival order.
pub fn ingest_chunks<'a, I>(chunks: I, opts: &Options) -> Vec<ParseOutcome>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut parser = StreamingParser::new(opts.clone());
    chunks
        .into_iter()
        .map(|c| parser.ingest(c))
        .filter(|o| !o.is_pending())
        .collect()
}

#[cfg(test)]
mod tests;
