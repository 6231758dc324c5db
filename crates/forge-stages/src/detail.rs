//! Detail stage: given an accepted brief and the conversation so far, either
//! asks one clarifying question or emits a complete specification.

use crate::completion::{CompletionClient, CompletionRequest};
use forge_shared::{extract_fenced_json, DetailSpec, FollowUpQuestion, ProblemBrief};
use std::sync::Arc;

// larger budget than the classifier: this stage may need to produce a full
// structured specification
const MAX_TOKENS: u32 = 700;
const TEMPERATURE: f32 = 0.2;

/// Asked when the model's question envelope is empty.
pub const DEFAULT_FOLLOW_UP: &str = "Could you share more details?";
/// Asked when the completion service is unreachable.
pub const FALLBACK_QUESTION: &str =
    "Could you clarify a couple of details (service, frequency, action)?";

/// Elicitor verdict for one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailVerdict {
    /// One clarifying question for the user.
    Question(String),
    /// Enough information gathered; a complete specification.
    Spec(DetailSpec),
    /// Stage unconfigured; the orchestrator drops back to listening.
    Skipped,
    /// Upstream failure; carries the fixed clarifying question.
    Fallback(String),
}

pub struct DetailStage {
    client: Arc<dyn CompletionClient>,
    prompt: Option<String>,
    model: String,
}

impl DetailStage {
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

    /// Runs one elicitation round. The current spec, when present, is shown
    /// to the model so already-answered fields are not asked again.
    pub async fn elicit(
        &self,
        brief: &ProblemBrief,
        recent_user_text: &str,
        current_spec: Option<&DetailSpec>,
    ) -> DetailVerdict {
        let Some(prompt) = self.prompt.as_deref() else {
            return DetailVerdict::Skipped;
        };

        let request = CompletionRequest {
            system_prompt: prompt.to_string(),
            user_content: compose_payload(brief, recent_user_text, current_spec),
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let content = match self.client.complete(request).await {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(stage = "detail", error = %err, "completion failed, asking fallback question");
                return DetailVerdict::Fallback(FALLBACK_QUESTION.to_string());
            }
        };

        if let Some(value) = extract_fenced_json(&content) {
            if let Some(spec) = DetailSpec::from_model_value(&value) {
                return DetailVerdict::Spec(spec);
            }
            if let Some(follow_up) = FollowUpQuestion::from_model_value(&value) {
                let question = follow_up.first().unwrap_or(DEFAULT_FOLLOW_UP).to_string();
                return DetailVerdict::Question(question);
            }
        }
        // no recognized object: the raw reply is the question
        let trimmed = content.trim();
        if trimmed.is_empty() {
            DetailVerdict::Question(DEFAULT_FOLLOW_UP.to_string())
        } else {
            DetailVerdict::Question(trimmed.to_string())
        }
    }
}

/// Serialized brief, the spec gathered so far, and the newest user answer in
/// labeled sections.
fn compose_payload(
    brief: &ProblemBrief,
    recent_user_text: &str,
    current_spec: Option<&DetailSpec>,
) -> String {
    let mut pieces = vec![
        "ProblemBrief:".to_string(),
        serde_json::to_string(brief).unwrap_or_default(),
    ];
    if let Some(spec) = current_spec {
        pieces.push("Current DetailSpec:".to_string());
        pieces.push(serde_json::to_string(spec).unwrap_or_default());
    }
    if !recent_user_text.is_empty() {
        pieces.push("Recent user message:".to_string());
        pieces.push(recent_user_text.to_string());
    }
    pieces.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionError;
    use crate::testing::ScriptedClient;
    use forge_shared::ProblemCategory;
    use serde_json::json;

    fn brief() -> ProblemBrief {
        ProblemBrief {
            summary: "nightly job fails silently".to_string(),
            category: ProblemCategory::Reliability,
            signals: vec!["fails".to_string(), "manual rerun".to_string()],
        }
    }

    #[tokio::test]
    async fn unconfigured_prompt_skips_the_stage() {
        let client = ScriptedClient::new(vec![]);
        let stage = DetailStage::new(client, None, "model");
        assert_eq!(
            stage.elicit(&brief(), "some answer", None).await,
            DetailVerdict::Skipped
        );
    }

    #[tokio::test]
    async fn follow_up_question_surfaces_first_entry() {
        let reply = format!(
            "```json\n{}\n```",
            json!({
                "type": "FollowUpQuestion",
                "questions": ["Which service runs the job?", "How often?"]
            })
        );
        let client = ScriptedClient::new(vec![Ok(reply)]);
        let stage = DetailStage::new(client, Some("detail prompt".into()), "model");
        assert_eq!(
            stage.elicit(&brief(), "it fails at 2am", None).await,
            DetailVerdict::Question("Which service runs the job?".to_string())
        );
    }

    #[tokio::test]
    async fn empty_question_list_falls_back_to_default() {
        let reply = "```json\n{\"type\": \"FollowUpQuestion\", \"questions\": []}\n```";
        let client = ScriptedClient::new(vec![Ok(reply.to_string())]);
        let stage = DetailStage::new(client, Some("detail prompt".into()), "model");
        assert_eq!(
            stage.elicit(&brief(), "", None).await,
            DetailVerdict::Question(DEFAULT_FOLLOW_UP.to_string())
        );
    }

    #[tokio::test]
    async fn complete_spec_is_returned_as_spec() {
        let reply = format!(
            "```json\n{}\n```",
            json!({
                "type": "DetailSpec",
                "service": "report-builder",
                "schedule": "nightly",
                "action": "rerun and notify slack"
            })
        );
        let client = ScriptedClient::new(vec![Ok(reply)]);
        let stage = DetailStage::new(client, Some("detail prompt".into()), "model");
        match stage.elicit(&brief(), "notify #ops", None).await {
            DetailVerdict::Spec(spec) => {
                assert_eq!(spec.fields["service"], json!("report-builder"));
                assert!(spec.is_complete());
            }
            other => panic!("expected spec, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unrecognized_json_payload_is_returned_verbatim() {
        let reply = "```json\n{\"type\": \"SomethingElse\", \"note\": \"x\"}\n```";
        let client = ScriptedClient::new(vec![Ok(reply.to_string())]);
        let stage = DetailStage::new(client, Some("detail prompt".into()), "model");
        assert_eq!(
            stage.elicit(&brief(), "hm", None).await,
            DetailVerdict::Question(reply.to_string())
        );
    }

    #[tokio::test]
    async fn plain_text_reply_becomes_the_question_verbatim() {
        let client =
            ScriptedClient::new(vec![Ok("  What alerting channel do you use?  ".to_string())]);
        let stage = DetailStage::new(client, Some("detail prompt".into()), "model");
        assert_eq!(
            stage.elicit(&brief(), "hm", None).await,
            DetailVerdict::Question("What alerting channel do you use?".to_string())
        );
    }

    #[tokio::test]
    async fn payload_includes_brief_spec_and_recent_answer() {
        let reply = "```json\n{\"type\": \"FollowUpQuestion\", \"questions\": [\"q\"]}\n```";
        let client = ScriptedClient::new(vec![Ok(reply.to_string())]);
        let stage = DetailStage::new(client.clone(), Some("detail prompt".into()), "model");
        let mut spec = DetailSpec::default();
        spec.fields.insert("service".into(), json!("ci"));
        stage.elicit(&brief(), "every weekday", Some(&spec)).await;
        let seen = client.seen.lock().await;
        let payload = &seen[0].user_content;
        assert!(payload.contains("ProblemBrief:"));
        assert!(payload.contains("Current DetailSpec:"));
        assert!(payload.contains("\"service\":\"ci\""));
        assert!(payload.contains("Recent user message:\nevery weekday"));
        assert_eq!(seen[0].max_tokens, 700);
    }

    #[tokio::test]
    async fn upstream_failure_yields_fixed_fallback_question() {
        let client = ScriptedClient::new(vec![Err(CompletionError::Status {
            status: 503,
            body: "unavailable".to_string(),
        })]);
        let stage = DetailStage::new(client, Some("detail prompt".into()), "model");
        assert_eq!(
            stage.elicit(&brief(), "answer", None).await,
            DetailVerdict::Fallback(FALLBACK_QUESTION.to_string())
        );
    }
}
