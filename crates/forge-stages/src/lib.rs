//! The three conversational stages that turn free-form developer speech into
//! an automation agent configuration: classify the problem, gather the
//! missing details, render the final document.
//!
//! Every stage degrades instead of failing: a missing prompt makes it a
//! no-op, and an upstream error collapses into a fixed fallback reply. The
//! user always gets a conversational response.

mod completion;
pub mod detail;
pub mod generator;
pub mod journal;
pub mod signals;
#[cfg(test)]
pub(crate) mod testing;

pub use completion::{CompletionClient, CompletionError, CompletionRequest, HttpCompletionClient};
pub use detail::{DetailStage, DetailVerdict};
pub use generator::{YamlStage, YamlVerdict};
pub use journal::{JournalStage, JournalVerdict};

use std::sync::Arc;

/// Why a stage degraded instead of producing model-driven output. Logged for
/// observability, never surfaced to the user as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackCause {
    /// The stage prompt was never configured.
    Unconfigured,
    /// The completion service failed or returned garbage.
    Upstream,
    /// The model answered with nothing worth repeating.
    EmptyReply,
}

/// System prompts for the three stages. Any absent prompt degrades its stage
/// to the documented no-op, never a startup failure.
#[derive(Debug, Clone, Default)]
pub struct StagePrompts {
    pub journal: Option<String>,
    pub detail: Option<String>,
    pub yaml: Option<String>,
}

/// Model identifiers per stage. The classifier and elicitor share a small
/// fast model; the generator gets a larger one since its output is parsed
/// and persisted.
#[derive(Debug, Clone)]
pub struct StageModels {
    pub classifier: String,
    pub generator: String,
}

impl Default for StageModels {
    fn default() -> Self {
        Self {
            classifier: "anthropic/claude-3-haiku".to_string(),
            generator: "anthropic/claude-3-5-sonnet".to_string(),
        }
    }
}

/// The three stages wired to one completion client.
pub struct StageSet {
    pub journal: JournalStage,
    pub detail: DetailStage,
    pub yaml: YamlStage,
}

impl StageSet {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        prompts: StagePrompts,
        models: StageModels,
    ) -> Self {
        Self {
            journal: JournalStage::new(
                Arc::clone(&client),
                prompts.journal,
                models.classifier.clone(),
            ),
            detail: DetailStage::new(Arc::clone(&client), prompts.detail, models.classifier),
            yaml: YamlStage::new(client, prompts.yaml, models.generator),
        }
    }
}
