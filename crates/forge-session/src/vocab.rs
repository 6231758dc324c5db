//! Confirmation vocabulary for the final consent gate.

const AFFIRMATIVE: &[&str] = &[
    "yes", "yeah", "yep", "ok", "okay", "sure", "confirm", "proceed", "go ahead", "do it",
];
const NEGATIVE: &[&str] = &["no", "nope", "stop", "cancel", "abort", "never mind", "don't"];

/// Outcome of matching a confirmation reply against the fixed vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consent {
    Affirmed,
    Declined,
    /// Neither vocabulary matched; the confirmation question is re-asked
    /// rather than advancing or discarding on a misheard reply.
    Ambiguous,
}

/// Classifies a reply case-insensitively. Single tokens must match a whole
/// word (so "know" never reads as "no"); multi-word phrases match as
/// substrings.
pub fn classify(text: &str) -> Consent {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();
    let matches = |vocab: &[&str]| {
        vocab.iter().any(|token| {
            if token.contains(' ') {
                lower.contains(token)
            } else {
                words.iter().any(|word| word == token)
            }
        })
    };
    if matches(AFFIRMATIVE) {
        Consent::Affirmed
    } else if matches(NEGATIVE) {
        Consent::Declined
    } else {
        Consent::Ambiguous
    }
}
