// src/core/normalizer.rs
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalizes free text into the comparable form every index is keyed by:
/// lower-case, no diacritics, "ç" folded to "c", single spaces, trimmed.
///
/// Total and idempotent. Empty or whitespace-only input yields `""`, which
/// callers treat as "no signal".
pub fn normalize(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut pending_space = false;

    // Lower-case first: some lower-case mappings emit combining marks,
    // which the decomposition pass below then strips. "ç" decomposes to
    // "c" + U+0327, so the cedilla goes the same way as any accent.
    for c in input.to_lowercase().nfd() {
        if is_combining_mark(c) {
            continue;
        }
        if c.is_whitespace() {
            pending_space = !result.is_empty();
            continue;
        }
        if pending_space {
            result.push(' ');
            pending_space = false;
        }
        result.push(c);
    }

    result
}

/// First space-delimited token of an already normalized string.
pub fn first_token(normalized: &str) -> Option<&str> {
    normalized.split(' ').next().filter(|t| !t.is_empty())
}
