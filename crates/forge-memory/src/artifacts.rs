//! On-disk layout for confirmed agent configurations.

use crate::MemoryError;
use async_trait::async_trait;
use forge_session::{ArtifactSink, SinkError};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Writes each confirmed configuration to its own directory:
/// `<root>/agents/agent_<uuid>/agent.yaml`.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Writes the artifact and returns the path of the YAML file. Content
    /// that fails a YAML syntax check is still persisted, with a warning;
    /// the user confirmed this exact text.
    pub fn write(&self, artifact: &str) -> Result<PathBuf, MemoryError> {
        if let Err(err) = serde_yaml::from_str::<serde_yaml::Value>(artifact) {
            tracing::warn!(error = %err, "persisting artifact that is not valid YAML");
        }
        let dir = self.root.join("agents").join(format!("agent_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir)?;
        let path = dir.join("agent.yaml");
        fs::write(&path, artifact)?;
        Ok(path)
    }
}

#[async_trait]
impl ArtifactSink for ArtifactStore {
    async fn persist(&self, artifact: &str) -> Result<String, SinkError> {
        let path = self.write(artifact)?;
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_into_a_fresh_agent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let path = store.write("agent:\n  name: watcher\n").unwrap();
        assert!(path.ends_with("agent.yaml"));
        assert!(path.starts_with(dir.path().join("agents")));
        assert_eq!(fs::read_to_string(&path).unwrap(), "agent:\n  name: watcher\n");
    }

    #[test]
    fn consecutive_writes_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let a = store.write("agent: {name: a}").unwrap();
        let b = store.write("agent: {name: b}").unwrap();
        assert_ne!(a, b);
        assert_eq!(fs::read_to_string(&a).unwrap(), "agent: {name: a}");
        assert_eq!(fs::read_to_string(&b).unwrap(), "agent: {name: b}");
    }

    #[test]
    fn invalid_yaml_is_persisted_anyway() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let content = "agent: [unterminated";
        let path = store.write(content).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[tokio::test]
    async fn sink_trait_reports_the_written_location() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let location = ArtifactSink::persist(&store, "agent: {}").await.unwrap();
        assert!(location.contains("agent.yaml"));
        assert!(Path::new(&location).exists());
    }
}
