//! Artifact storage for pipeline runs.
//!
//! A run's artifacts are grouped under its [`LocationKey`]. The file store
//! lays them out as `<root>/<key>/bookings.json` and
//! `<root>/<key>/anomalies.json`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::config::LocationKey;
use crate::error::{PipelineError, Result};

/// Default directory that holds one sub-directory per run.
pub const DEFAULT_DATA_ROOT: &str = "/tmp/data/bookings";

/// The two artifacts a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// The generated booking batch
    Bookings,
    /// The anomaly report derived from the batch
    Anomalies,
}

impl ArtifactKind {
    /// File name of this artifact inside a run directory.
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Bookings => "bookings.json",
            Self::Anomalies => "anomalies.json",
        }
    }
}

/// Storage backend for run artifacts.
///
/// Writes must be all-or-nothing: a reader never observes a partially
/// written artifact.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Human-readable location of an artifact, for logs.
    fn location(&self, key: &LocationKey, kind: ArtifactKind) -> String;

    /// Persists an artifact, replacing any previous content.
    async fn write_artifact(
        &self,
        key: &LocationKey,
        kind: ArtifactKind,
        bytes: &[u8],
    ) -> Result<()>;

    /// Reads an artifact back.
    ///
    /// # Errors
    /// Returns [`PipelineError::NotFound`] if the artifact was never written.
    async fn read_artifact(&self, key: &LocationKey, kind: ArtifactKind) -> Result<Vec<u8>>;
}

/// Flat-file artifact store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    root: PathBuf,
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_ROOT)
    }
}

impl FileStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding every run.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one run's artifacts.
    pub fn run_dir(&self, key: &LocationKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    /// Full path of an artifact.
    pub fn artifact_path(&self, key: &LocationKey, kind: ArtifactKind) -> PathBuf {
        self.run_dir(key).join(kind.file_name())
    }

    async fn write_then_rename(staging: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
        let mut file = tokio::fs::File::create(staging)
            .await
            .map_err(|e| PipelineError::io(staging, "create", e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| PipelineError::io(staging, "write", e))?;
        file.sync_all()
            .await
            .map_err(|e| PipelineError::io(staging, "flush", e))?;
        drop(file);

        tokio::fs::rename(staging, target)
            .await
            .map_err(|e| PipelineError::io(target, "move into place", e))
    }
}

#[async_trait]
impl ArtifactStore for FileStore {
    fn location(&self, key: &LocationKey, kind: ArtifactKind) -> String {
        self.artifact_path(key, kind).display().to_string()
    }

    async fn write_artifact(
        &self,
        key: &LocationKey,
        kind: ArtifactKind,
        bytes: &[u8],
    ) -> Result<()> {
        let dir = self.run_dir(key);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PipelineError::io(&dir, "create directory", e))?;

        let target = dir.join(kind.file_name());
        let staging = dir.join(format!(".{}.partial", kind.file_name()));

        if let Err(error) = Self::write_then_rename(&staging, &target, bytes).await {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
                tracing::debug!(
                    "Could not remove staging file {}: {}",
                    staging.display(),
                    cleanup
                );
            }
            return Err(error);
        }

        tracing::debug!("Wrote {} bytes to {}", bytes.len(), target.display());
        Ok(())
    }

    async fn read_artifact(&self, key: &LocationKey, kind: ArtifactKind) -> Result<Vec<u8>> {
        let path = self.artifact_path(key, kind);
        tokio::fs::read(&path)
            .await
            .map_err(|e| PipelineError::io(&path, "read", e))
    }
}
