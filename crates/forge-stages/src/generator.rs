//! Generator stage: renders a complete specification into the final agent
//! configuration document, or asks for the one piece still missing.

use crate::completion::{CompletionClient, CompletionRequest};
use forge_shared::{DetailSpec, MissingInfoRequest, ModelOutput};
use std::sync::Arc;

// the artifact is the largest output of the three stages
const MAX_TOKENS: u32 = 1600;
// zero temperature: this output is mechanically parsed and persisted
const TEMPERATURE: f32 = 0.0;

/// Asked when the model's missing-info envelope is empty.
pub const DEFAULT_MISSING_INFO: &str = "I need one more detail to finalize the configuration.";
/// Asked when the completion service is unreachable.
pub const FALLBACK_QUESTION: &str =
    "I need one more detail to finalize the configuration (service, schedule, or actions).";

/// Generator verdict for one specification.
#[derive(Debug, Clone, PartialEq)]
pub enum YamlVerdict {
    /// A ready configuration document.
    Artifact(String),
    /// One question whose answer unblocks generation.
    MissingInfo(String),
    /// Stage unconfigured.
    Skipped,
    /// Upstream failure; carries the fixed missing-info question.
    Fallback(String),
}

pub struct YamlStage {
    client: Arc<dyn CompletionClient>,
    prompt: Option<String>,
    model: String,
}

impl YamlStage {
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

    /// Produces the configuration document for `spec`, or the question that
    /// unblocks it. A yaml fence is the highest-priority interpretation;
    /// with neither fence nor envelope, the raw reply is taken as the
    /// artifact.
    pub async fn generate(&self, spec: &DetailSpec) -> YamlVerdict {
        let Some(prompt) = self.prompt.as_deref() else {
            return YamlVerdict::Skipped;
        };

        let request = CompletionRequest {
            system_prompt: prompt.to_string(),
            user_content: serde_json::to_string(spec).unwrap_or_default(),
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };
        let content = match self.client.complete(request).await {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(stage = "yaml", error = %err, "completion failed, asking for missing details");
                return YamlVerdict::Fallback(FALLBACK_QUESTION.to_string());
            }
        };

        match ModelOutput::parse(&content) {
            ModelOutput::Config(yaml) => YamlVerdict::Artifact(yaml),
            ModelOutput::Json(value) => match MissingInfoRequest::from_model_value(&value) {
                Some(request) => YamlVerdict::MissingInfo(
                    request.first().unwrap_or(DEFAULT_MISSING_INFO).to_string(),
                ),
                None => YamlVerdict::Artifact(content.trim().to_string()),
            },
            ModelOutput::Plain(_) => YamlVerdict::Artifact(content.trim().to_string()),
        }
    }
}
