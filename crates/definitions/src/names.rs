//! Keyword name rules shared by the definition loader and the tokenizer.

/// Longest permitted keyword name, wildcard marker excluded.
pub const MAX_NAME_LENGTH: usize = 8;

const WILDCARD_MARKER: char = '*';

/// A keyword name is 1..=8 characters: a leading ASCII uppercase letter
/// followed by uppercase letters, digits, `_` or `-`.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_uppercase() || name.len() > MAX_NAME_LENGTH {
        return false;
    }
    chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// A wildcard name is a valid name stem followed by a single trailing `*`.
pub fn is_wildcard_name(name: &str) -> bool {
    match name.strip_suffix(WILDCARD_MARKER) {
        Some(stem) => is_valid_name(stem),
        None => false,
    }
}

/// The literal prefix a wildcard name matches against, or `None` for an
/// ordinary name.
pub fn wildcard_prefix(name: &str) -> Option<&str> {
    if is_wildcard_name(name) {
        name.strip_suffix(WILDCARD_MARKER)
    } else {
        None
    }
}
