//! Keyword taxonomy used to double-check the classifier's judgment.
//!
//! The model over-triggers on casual mentions of words like "slow", so a
//! brief is only accepted when the raw user text also matches at least two
//! distinct signal categories. Both checks must agree.

/// Distinct categories required before a model-proposed brief is accepted.
pub const REQUIRED_CATEGORIES: usize = 2;

const FAILURE: &[&str] = &[
    "fail", "error", "crash", "broken", "exception", "panic", "bug",
];
const REPETITION: &[&str] = &[
    "manual",
    "repetitive",
    "every time",
    "keep having to",
    "by hand",
    "over and over",
    "again and again",
];
const BLOCKED: &[&str] = &["stuck", "blocked", "can't", "cannot", "unable", "waiting on"];
const RELIABILITY: &[&str] = &[
    "flaky",
    "randomly",
    "intermittent",
    "unreliable",
    "slow",
    "times out",
    "timeout",
];
const AUTOMATION: &[&str] = &[
    "automate",
    "automation",
    "monitor",
    "alert",
    "notify",
    "schedule",
    "cron",
];
const TIME_WASTE: &[&str] = &[
    "waste",
    "wasting",
    "tedious",
    "time-consuming",
    "takes hours",
    "takes forever",
];

const TAXONOMY: &[(&str, &[&str])] = &[
    ("failure", FAILURE),
    ("repetition", REPETITION),
    ("blocked", BLOCKED),
    ("reliability", RELIABILITY),
    ("automation", AUTOMATION),
    ("time-waste", TIME_WASTE),
];

/// Returns the distinct categories whose keywords appear in `text`,
/// case-insensitively.
pub fn matched_categories(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    TAXONOMY
        .iter()
        .filter(|(_, words)| words.iter().any(|word| lower.contains(word)))
        .map(|(name, _)| *name)
        .collect()
}

/// Heuristic gate: true when the text carries enough independent problem
/// signals to corroborate a model-proposed brief.
pub fn corroborates_problem(text: &str) -> bool {
    matched_categories(text).len() >= REQUIRED_CATEGORIES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crash_plus_manual_restart_matches_two_categories() {
        let text = "it keeps crashing and I have to restart it manually every time";
        let matched = matched_categories(text);
        assert!(matched.contains(&"failure"));
        assert!(matched.contains(&"repetition"));
        assert!(corroborates_problem(text));
    }

    #[test]
    fn a_lone_slow_mention_is_not_enough() {
        let text = "it's a bit slow today";
        assert_eq!(matched_categories(text), vec!["reliability"]);
        assert!(!corroborates_problem(text));
    }

    #[test]
    fn small_talk_matches_nothing() {
        assert!(matched_categories("lovely weather this morning").is_empty());
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(corroborates_problem(
            "The build FAILS and I'm STUCK waiting on reruns"
        ));
    }
}
