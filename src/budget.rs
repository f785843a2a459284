pub fn approx_tokens(s: &str) -> usize {
    // heuristic ~4 chars/token
    (s.chars().count() + 3) / 4
}

/// Truncates `text` on a char boundary so it stays within `max_tokens`.
pub fn cap_to_tokens(text: &str, max_tokens: usize) -> &str {
    if approx_tokens(text) <= max_tokens {
        return text;
    }
    let max_chars = max_tokens.saturating_mul(4);
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
