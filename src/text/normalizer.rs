//! Text normalization for the ASR word-error-rate adjunct (§2 item 10).
//!
//! Keeps the teacher's casefolding convention (`to_lowercase()` in
//! `calculate_word_error_rate`) and adds punctuation-stripping so two
//! transcripts that differ only in case or punctuation normalize equal.

/// Lowercases and strips non-alphanumeric, non-whitespace characters.
///
/// Idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
