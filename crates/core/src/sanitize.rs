//! Input sanitization applied to user-supplied payload fields before they
//! are persisted on a job record. Field-level validation (lengths, XSS
//! screening) happens in the HTTP layer; this is the last-line cleanup the
//! job record itself guarantees.

/// Strip control characters and trim surrounding whitespace.
///
/// Newlines are preserved (lyrics and narration are multi-line).
pub fn clean(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .collect::<String>()
        .trim()
        .to_string()
}

/// [`clean`] for optional fields; empty results become `None`.
pub fn clean_opt(input: &str) -> Option<String> {
    let cleaned = clean(input);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
