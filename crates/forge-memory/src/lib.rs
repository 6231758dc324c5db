//! Durable storage for the orchestrator: a sled-backed transcript journal
//! and an on-disk layout for confirmed agent configurations.

mod artifacts;
mod transcript;

pub use artifacts::ArtifactStore;
pub use transcript::TranscriptStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("storage error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
