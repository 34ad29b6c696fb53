#[inline]
pub fn is_whitespace(c: char) -> bool {
    matches!(c, '\u{0009}' | '\u{000A}' | '\u{000D}' | '\u{0020}')
}

#[inline]
pub fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

#[inline]
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Bareword that strict JSON already understands as a literal.
#[inline]
pub fn is_json_keyword(word: &str) -> bool {
    matches!(word, "true" | "false" | "null")
}

/// Token that looks like a JSON number, so quoting it would change its type.
pub fn is_number_like(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() || c == '-' => {}
        _ => return false,
    }
    word.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
}

#[inline]
pub fn is_close_delim(c: char) -> bool {
    c == '}' || c == ']'
}
