//! Wildcard matching of console lines

/// Check whether `text` contains `pattern`.
///
/// The pattern is split on `*` into literal fragments which must appear in
/// `text` in order, each found at the first position after the previous one.
/// Matching is not anchored: text before, between and after the fragments is
/// ignored. An empty pattern only matches empty text.
pub fn matches(text: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return text.is_empty();
    }

    let mut cursor = 0;
    for fragment in pattern.split('*') {
        match text[cursor..].find(fragment) {
            Some(pos) => cursor += pos + fragment.len(),
            None => return false,
        }
    }
    true
}
