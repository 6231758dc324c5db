//! Journal stage: decides whether one user turn describes an automatable
//! problem, and summarizes ordinary input. Runs on every turn, so it must
//! never break conversation flow; all failures collapse into a neutral
//! verdict.

use crate::completion::{CompletionClient, CompletionRequest};
use crate::{signals, FallbackCause};
use forge_shared::{extract_fenced_json, strip_fences, ProblemBrief};
use std::sync::Arc;

const MAX_TOKENS: u32 = 400;
// low temperature: this stage needs determinism, not creativity
const TEMPERATURE: f32 = 0.1;
const SUMMARY_LINES: usize = 3;

/// Classifier verdict for one user turn.
#[derive(Debug, Clone, PartialEq)]
pub enum JournalVerdict {
    /// The model proposed a brief and the signal heuristic agreed.
    Brief(ProblemBrief),
    /// Ordinary input; a compact summary of the model's reply.
    Summary(String),
    /// Degraded: nothing worth surfacing beyond a neutral acknowledgment.
    Neutral(FallbackCause),
}

pub struct JournalStage {
    client: Arc<dyn CompletionClient>,
    prompt: Option<String>,
    model: String,
}

impl JournalStage {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        prompt: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            prompt,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Classifies one turn. A brief is accepted only when the model tags one
    /// AND the raw text matches at least two signal categories; the model
    /// alone over-triggers.
    pub async fn classify(&self, user_text: &str) -> JournalVerdict {
        let Some(prompt) = self.prompt.as_deref() else {
            return JournalVerdict::Neutral(FallbackCause::Unconfigured);
        };

        let request = CompletionRequest {
            system_prompt: prompt.to_string(),
            user_content: user_text.to_string(),
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let content = match self.client.complete(request).await {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(stage = "journal", error = %err, "completion failed, replying neutrally");
                return JournalVerdict::Neutral(FallbackCause::Upstream);
            }
        };

        if let Some(value) = extract_fenced_json(&content) {
            if let Some(brief) = ProblemBrief::from_model_value(&value) {
                if signals::corroborates_problem(user_text) {
                    return JournalVerdict::Brief(brief);
                }
                tracing::debug!(
                    stage = "journal",
                    "model proposed a brief but the text lacks corroborating signals"
                );
            }
        }

        match summarize(&content) {
            Some(summary) => JournalVerdict::Summary(summary),
            None => JournalVerdict::Neutral(FallbackCause::EmptyReply),
        }
    }
}

/// Collapses a free-text reply into at most three non-empty lines joined as
/// one compact sentence; bullet markers are flattened and the first letter
/// capitalized.
fn summarize(content: &str) -> Option<String> {
    let stripped = strip_fences(content);
    let lines: Vec<&str> = stripped
        .lines()
        .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim())
        .filter(|line| !line.is_empty())
        .take(SUMMARY_LINES)
        .collect();
    if lines.is_empty() {
        return None;
    }
    let joined = lines.join("; ");
    let mut chars = joined.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().collect::<String>() + chars.as_str())
}
