//! Layered repair strategies for malformed JSON.
//!
//! Each strategy is a pure function from text to [`RecoveryResult`]. A
//! strategy that is handed already-valid JSON returns it unchanged and marked
//! successful, so running recovery on good input is always a no-op. The two
//! entry points differ only in ordering: [`recover_fast`] tries the repairs
//! most likely to fix an LLM truncation first, [`recover_all`] walks the full
//! ladder in priority order. Both fall back to flat key-value salvage when
//! everything else fails (unless `Options.salvage_fallback` is off).

use crate::classify::{
    is_close_delim, is_identifier_char, is_identifier_start, is_json_keyword, is_number_like,
    is_whitespace,
};
use crate::options::Options;
use memchr::{memchr, memrchr};
use serde_json::{Map, Value};

pub const CLOSE_DELIMITERS: &str = "close_delimiters";
pub const CLOSE_TRUNCATED_STRING: &str = "close_truncated_string";
pub const REPAIR_SYNTAX: &str = "repair_syntax";
pub const QUOTE_BARE_VALUES: &str = "quote_bare_values";
pub const STRIP_TRAILING_COMMAS: &str = "strip_trailing_commas";
pub const CLOSE_OPEN_CONTAINERS: &str = "close_open_containers";
pub const EXTRACT_KEY_VALUES: &str = "extract_key_values";

/// Outcome of one recovery strategy.
///
/// When `success` is true, `recovered` re-parses as strict JSON and `value`
/// holds the parsed result. Strategy `extract_key_values` is special: its
/// output is a synthesized flat object rather than a repair of the whole
/// document.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryResult {
    pub success: bool,
    pub recovered: Option<String>,
    pub value: Option<Value>,
    pub strategy: &'static str,
    pub error: Option<String>,
}

impl RecoveryResult {
    fn fixed(strategy: &'static str, recovered: String, value: Value) -> Self {
        Self {
            success: true,
            recovered: Some(recovered),
            value: Some(value),
            strategy,
            error: None,
        }
    }

    fn failed(strategy: &'static str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            recovered: None,
            value: None,
            strategy,
            error: Some(error.into()),
        }
    }
}

/// One attempted strategy, recorded when `Options.logging` is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryLogEntry {
    pub strategy: &'static str,
    pub succeeded: bool,
    pub detail: String,
}

/// Diagnostic delimiter diff between original and recovered text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RecoveryStats {
    pub braces_added: usize,
    pub brackets_added: usize,
    pub quotes_added: usize,
    pub commas_removed: usize,
}

#[inline]
fn strict(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

fn unescaped_quote_count(s: &str) -> usize {
    let mut count = 0usize;
    let mut escape = false;
    for c in s.chars() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' => escape = true,
            '"' => count += 1,
            _ => {}
        }
    }
    count
}

/// Running `open - close` difference for brackets and braces, string-aware.
fn open_close_balance(s: &str) -> (i64, i64) {
    let mut in_str = false;
    let mut escape = false;
    let mut brackets = 0i64;
    let mut braces = 0i64;
    for c in s.chars() {
        if in_str {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_str = false;
            }
            continue;
        }
        match c {
            '"' => in_str = true,
            '[' => brackets += 1,
            ']' => brackets -= 1,
            '{' => braces += 1,
            '}' => braces -= 1,
            _ => {}
        }
    }
    (brackets, braces)
}

/// Append the closing delimiters a truncated stream dropped: an unterminated
/// string first, then `]` per unmatched `[`, then `}` per unmatched `{`.
/// Arrays close before objects since a partial token stream truncates the
/// innermost structure last.
fn append_missing_closers(input: &str) -> String {
    let mut fixed = input.trim_end().to_string();
    if unescaped_quote_count(&fixed) % 2 == 1 {
        fixed.push('"');
    }
    if fixed.ends_with(',') {
        fixed.pop();
    }
    let (brackets, braces) = open_close_balance(&fixed);
    for _ in 0..brackets.max(0) {
        fixed.push(']');
    }
    for _ in 0..braces.max(0) {
        fixed.push('}');
    }
    fixed
}

/// Strategy 1: balance quotes, strip one dangling comma, close unmatched
/// brackets and braces.
pub fn close_delimiters(input: &str) -> RecoveryResult {
    if let Some(v) = strict(input) {
        return RecoveryResult::fixed(CLOSE_DELIMITERS, input.to_string(), v);
    }
    let fixed = append_missing_closers(input);
    match strict(&fixed) {
        Some(v) => RecoveryResult::fixed(CLOSE_DELIMITERS, fixed, v),
        None => RecoveryResult::failed(CLOSE_DELIMITERS, "still invalid after closing delimiters"),
    }
}

/// Strategy 2: terminate a string value cut off mid-token, then close outer
/// structures. The last `"` must open a value, not a key: the nearest
/// preceding `:` has to come after the nearest preceding `{`.
pub fn close_truncated_string(input: &str) -> RecoveryResult {
    if let Some(v) = strict(input) {
        return RecoveryResult::fixed(CLOSE_TRUNCATED_STRING, input.to_string(), v);
    }
    if unescaped_quote_count(input) % 2 == 0 {
        return RecoveryResult::failed(CLOSE_TRUNCATED_STRING, "no unterminated string");
    }
    let Some(last_quote) = memrchr(b'"', input.as_bytes()) else {
        return RecoveryResult::failed(CLOSE_TRUNCATED_STRING, "no string in input");
    };
    let before = &input[..last_quote];
    let opens_value = match (before.rfind(':'), before.rfind('{')) {
        (Some(colon), Some(brace)) => colon > brace,
        (Some(_), None) => true,
        _ => false,
    };
    if !opens_value {
        return RecoveryResult::failed(CLOSE_TRUNCATED_STRING, "last quote opens a key, not a value");
    }
    let mut fixed = input.to_string();
    fixed.push('"');
    let fixed = append_missing_closers(&fixed);
    match strict(&fixed) {
        Some(v) => RecoveryResult::fixed(CLOSE_TRUNCATED_STRING, fixed, v),
        None => RecoveryResult::failed(
            CLOSE_TRUNCATED_STRING,
            "still invalid after terminating string",
        ),
    }
}

/// Single-quote-to-double-quote and unquoted-key rewriting shared by
/// strategy 3.
fn rewrite_syntax(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 8);
    let mut in_str = false;
    let mut escape = false;
    // Last significant char emitted outside strings; a bare identifier is
    // only a key candidate right after `{` or `,`.
    let mut prev_sig: Option<char> = None;
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        if in_str {
            out.push(c);
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_str = false;
                prev_sig = Some('"');
            }
            i += 1;
            continue;
        }
        if c == '"' {
            in_str = true;
            out.push(c);
            i += 1;
            continue;
        }
        if c == '\'' {
            out.push('"');
            i += 1;
            let mut esc = false;
            while i < chars.len() {
                let c2 = chars[i];
                i += 1;
                if esc {
                    out.push(c2);
                    esc = false;
                    continue;
                }
                match c2 {
                    '\\' => {
                        out.push('\\');
                        esc = true;
                    }
                    '\'' => break,
                    '"' => out.push_str("\\\""),
                    _ => out.push(c2),
                }
            }
            out.push('"');
            prev_sig = Some('"');
            continue;
        }
        if is_identifier_start(c) && matches!(prev_sig, Some('{') | Some(',')) {
            let start = i;
            let mut j = i;
            while j < chars.len() && is_identifier_char(chars[j]) {
                j += 1;
            }
            let mut k = j;
            while k < chars.len() && is_whitespace(chars[k]) {
                k += 1;
            }
            let word: String = chars[start..j].iter().collect();
            if k < chars.len() && chars[k] == ':' {
                out.push('"');
                out.push_str(&word);
                out.push('"');
                prev_sig = Some('"');
            } else {
                out.push_str(&word);
                prev_sig = word.chars().next_back().or(Some(c));
            }
            i = j;
            continue;
        }
        out.push(c);
        if !is_whitespace(c) {
            prev_sig = Some(c);
        }
        i += 1;
    }
    out
}

/// Drop commas sitting immediately before a closing delimiter. With
/// `at_end_of_string`, a comma at the very end of the text is dropped too.
fn strip_close_commas(input: &str, at_end_of_string: bool) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_str = false;
    let mut escape = false;
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        if in_str {
            out.push(c);
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_str = false;
            }
            i += 1;
            continue;
        }
        if c == '"' {
            in_str = true;
            out.push(c);
            i += 1;
            continue;
        }
        if c == ',' {
            let mut j = i + 1;
            while j < chars.len() && is_whitespace(chars[j]) {
                j += 1;
            }
            let before_close = j < chars.len() && is_close_delim(chars[j]);
            let at_end = j >= chars.len() && at_end_of_string;
            if before_close || at_end {
                i += 1;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Strategy 3: quote unquoted object keys, convert single quotes to double
/// quotes, and drop commas before closing delimiters.
pub fn repair_syntax(input: &str) -> RecoveryResult {
    if let Some(v) = strict(input) {
        return RecoveryResult::fixed(REPAIR_SYNTAX, input.to_string(), v);
    }
    let fixed = strip_close_commas(&rewrite_syntax(input), false);
    match strict(&fixed) {
        Some(v) => RecoveryResult::fixed(REPAIR_SYNTAX, fixed, v),
        None => RecoveryResult::failed(REPAIR_SYNTAX, "still invalid after syntax rewrite"),
    }
}

/// Strategy 4: wrap bare identifier values (`: hello,`) in quotes. JSON
/// keywords stay untouched; number-like tokens are left alone so their type
/// is preserved.
pub fn quote_bare_values(input: &str) -> RecoveryResult {
    if let Some(v) = strict(input) {
        return RecoveryResult::fixed(QUOTE_BARE_VALUES, input.to_string(), v);
    }
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 8);
    let mut in_str = false;
    let mut escape = false;
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        if in_str {
            out.push(c);
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_str = false;
            }
            i += 1;
            continue;
        }
        if c == '"' {
            in_str = true;
            out.push(c);
            i += 1;
            continue;
        }
        out.push(c);
        i += 1;
        if c != ':' {
            continue;
        }
        let mut j = i;
        let ws_start = j;
        while j < chars.len() && is_whitespace(chars[j]) {
            j += 1;
        }
        if j >= chars.len() || !is_identifier_start(chars[j]) {
            continue;
        }
        let word_start = j;
        while j < chars.len() && is_identifier_char(chars[j]) {
            j += 1;
        }
        let mut k = j;
        while k < chars.len() && is_whitespace(chars[k]) {
            k += 1;
        }
        let followed = k >= chars.len() || chars[k] == ',' || is_close_delim(chars[k]);
        let word: String = chars[word_start..j].iter().collect();
        if followed && !is_json_keyword(&word) && !is_number_like(&word) {
            let ws: String = chars[ws_start..word_start].iter().collect();
            out.push_str(&ws);
            out.push('"');
            out.push_str(&word);
            out.push('"');
            i = j;
        }
    }
    match strict(&out) {
        Some(v) => RecoveryResult::fixed(QUOTE_BARE_VALUES, out, v),
        None => RecoveryResult::failed(QUOTE_BARE_VALUES, "still invalid after quoting values"),
    }
}

/// Strategy 5: remove any comma immediately before a closing delimiter or at
/// the end of the text.
pub fn strip_trailing_commas(input: &str) -> RecoveryResult {
    if let Some(v) = strict(input) {
        return RecoveryResult::fixed(STRIP_TRAILING_COMMAS, input.to_string(), v);
    }
    let fixed = strip_close_commas(input.trim_end(), true);
    match strict(&fixed) {
        Some(v) => RecoveryResult::fixed(STRIP_TRAILING_COMMAS, fixed, v),
        None => RecoveryResult::failed(STRIP_TRAILING_COMMAS, "still invalid after comma removal"),
    }
}

/// Strategy 6: an object opened but never closed (last `{` after last `}`)
/// gets a dangling comma stripped and the closing ladder from strategy 1.
pub fn close_open_containers(input: &str) -> RecoveryResult {
    if let Some(v) = strict(input) {
        return RecoveryResult::fixed(CLOSE_OPEN_CONTAINERS, input.to_string(), v);
    }
    let open_object = match (input.rfind('{'), input.rfind('}')) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    };
    if !open_object {
        return RecoveryResult::failed(CLOSE_OPEN_CONTAINERS, "no unclosed object");
    }
    let mut trimmed = input.trim_end().to_string();
    if trimmed.ends_with(',') {
        trimmed.pop();
    }
    let fixed = append_missing_closers(&trimmed);
    match strict(&fixed) {
        Some(v) => RecoveryResult::fixed(CLOSE_OPEN_CONTAINERS, fixed, v),
        None => RecoveryResult::failed(CLOSE_OPEN_CONTAINERS, "still invalid after closing object"),
    }
}

/// Index of the closing quote of the string opening at `open`, escape-aware.
fn find_string_end(input: &str, open: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut i = open + 1;
    let mut escape = false;
    while i < bytes.len() {
        let b = bytes[i];
        if escape {
            escape = false;
        } else if b == b'\\' {
            escape = true;
        } else if b == b'"' {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Strategy 7, last resort: salvage every `"key": <scalar>` pair found
/// anywhere in the text into one flat object, ignoring overall structure.
/// Values that fail to decode are skipped. Succeeds iff at least one pair was
/// extracted; the result is not a repair of the whole document.
pub fn extract_key_values(input: &str) -> RecoveryResult {
    if let Some(v) = strict(input) {
        return RecoveryResult::fixed(EXTRACT_KEY_VALUES, input.to_string(), v);
    }
    let bytes = input.as_bytes();
    let mut map = Map::new();
    let mut pos = 0usize;
    while pos < bytes.len() {
        let Some(rel) = memchr(b'"', &bytes[pos..]) else {
            break;
        };
        let key_open = pos + rel;
        let Some(key_close) = find_string_end(input, key_open) else {
            break;
        };
        let key: String = match serde_json::from_str(&input[key_open..=key_close]) {
            Ok(k) => k,
            Err(_) => {
                pos = key_open + 1;
                continue;
            }
        };
        let mut j = key_close + 1;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= bytes.len() || bytes[j] != b':' {
            pos = key_open + 1;
            continue;
        }
        j += 1;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= bytes.len() {
            break;
        }
        match bytes[j] {
            b'"' => {
                let Some(value_close) = find_string_end(input, j) else {
                    pos = key_open + 1;
                    continue;
                };
                match serde_json::from_str::<Value>(&input[j..=value_close]) {
                    Ok(v) => {
                        map.insert(key, v);
                        pos = value_close + 1;
                    }
                    Err(_) => pos = key_open + 1,
                }
            }
            b't' | b'f' | b'n' => {
                let mut end = j;
                while end < bytes.len() && bytes[end].is_ascii_alphabetic() {
                    end += 1;
                }
                match &input[j..end] {
                    "true" => {
                        map.insert(key, Value::Bool(true));
                    }
                    "false" => {
                        map.insert(key, Value::Bool(false));
                    }
                    "null" => {
                        map.insert(key, Value::Null);
                    }
                    _ => {
                        pos = key_open + 1;
                        continue;
                    }
                }
                pos = end;
            }
            b if b.is_ascii_digit() || b == b'-' => {
                let mut end = j;
                while end < bytes.len()
                    && (bytes[end].is_ascii_digit()
                        || matches!(bytes[end], b'-' | b'+' | b'.' | b'e' | b'E'))
                {
                    end += 1;
                }
                match serde_json::from_str::<Value>(&input[j..end]) {
                    Ok(v) => {
                        map.insert(key, v);
                        pos = end;
                    }
                    Err(_) => pos = key_open + 1,
                }
            }
            _ => pos = key_open + 1,
        }
    }
    if map.is_empty() {
        return RecoveryResult::failed(EXTRACT_KEY_VALUES, "no key-value pairs found");
    }
    let value = Value::Object(map);
    let recovered = value.to_string();
    RecoveryResult::fixed(EXTRACT_KEY_VALUES, recovered, value)
}

type Strategy = fn(&str) -> RecoveryResult;

/// Most-likely-first ordering for LLM truncation.
const FAST_ORDER: &[Strategy] = &[
    close_delimiters,
    strip_trailing_commas,
    repair_syntax,
    close_truncated_string,
];

/// Full ladder in strict priority order.
const FULL_ORDER: &[Strategy] = &[
    close_delimiters,
    close_truncated_string,
    repair_syntax,
    quote_bare_values,
    strip_trailing_commas,
    close_open_containers,
];

fn run_order(
    input: &str,
    order: &[Strategy],
    opts: &Options,
) -> (RecoveryResult, Vec<RecoveryLogEntry>) {
    let mut log = Vec::new();
    let note = |res: &RecoveryResult, log: &mut Vec<RecoveryLogEntry>| {
        if opts.logging {
            log.push(RecoveryLogEntry {
                strategy: res.strategy,
                succeeded: res.success,
                detail: res.error.clone().unwrap_or_default(),
            });
        }
    };
    let mut last = RecoveryResult::failed(CLOSE_DELIMITERS, "no strategy attempted");
    for strategy in order {
        let res = strategy(input);
        note(&res, &mut log);
        if res.success {
            return (res, log);
        }
        last = res;
    }
    if opts.salvage_fallback {
        let res = extract_key_values(input);
        note(&res, &mut log);
        return (res, log);
    }
    (last, log)
}

/// Try the repairs most likely to fix an LLM truncation, cheapest recall
/// trade-off: {1, 5, 3, 2}, then flat salvage.
pub fn recover_fast(input: &str, opts: &Options) -> RecoveryResult {
    run_order(input, FAST_ORDER, opts).0
}

/// Try every whole-document strategy in priority order {1..6}, then flat
/// salvage.
pub fn recover_all(input: &str, opts: &Options) -> RecoveryResult {
    run_order(input, FULL_ORDER, opts).0
}

/// [`recover_fast`] plus the per-strategy attempt log (empty unless
/// `Options.logging` is set).
pub fn recover_fast_with_log(
    input: &str,
    opts: &Options,
) -> (RecoveryResult, Vec<RecoveryLogEntry>) {
    run_order(input, FAST_ORDER, opts)
}

/// [`recover_all`] plus the per-strategy attempt log.
pub fn recover_all_with_log(
    input: &str,
    opts: &Options,
) -> (RecoveryResult, Vec<RecoveryLogEntry>) {
    run_order(input, FULL_ORDER, opts)
}

fn count_char(s: &str, target: char) -> usize {
    s.chars().filter(|&c| c == target).count()
}

/// Diagnostic only: how many delimiters a recovery added or removed, derived
/// by diffing counts between original and recovered text.
pub fn recovery_stats(original: &str, recovered: &str) -> RecoveryStats {
    RecoveryStats {
        braces_added: count_char(recovered, '}').saturating_sub(count_char(original, '}')),
        brackets_added: count_char(recovered, ']').saturating_sub(count_char(original, ']')),
        quotes_added: count_char(recovered, '"').saturating_sub(count_char(original, '"')),
        commas_removed: count_char(original, ',').saturating_sub(count_char(recovered, ',')),
    }
}
