//! Durable collaborators the orchestrator writes through. Implemented by
//! forge-memory; tests substitute recording fakes.

use async_trait::async_trait;
use forge_shared::TurnRecord;

pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Sink for confirmed artifacts. Called exactly once per affirmative
/// confirmation.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Persists the artifact and returns a human-readable location.
    async fn persist(&self, artifact: &str) -> Result<String, SinkError>;
}

/// Sink for per-turn transcript records. Failures are logged by the
/// orchestrator and never affect the conversational reply.
#[async_trait]
pub trait TranscriptSink: Send + Sync {
    async fn append(&self, record: &TurnRecord) -> Result<(), SinkError>;
}
