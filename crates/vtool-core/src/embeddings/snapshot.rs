//! Precomputed embedding snapshots
//!
//! The host ships a table of tool-name → vector computed at build time for
//! its own tools. The file is versioned by the host application version so
//! a stale table from a previous release is never mixed in.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::{EmbeddingError, EmbeddingResult};
use super::traits::{Embedding, EmbeddingKind, EmbeddingSnapshotSource};

/// On-disk snapshot layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Host application version the vectors were computed for
    pub version: String,
    /// Model the vectors came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EmbeddingKind>,
    #[serde(default)]
    pub embeddings: HashMap<String, Embedding>,
}

/// Snapshot read from `tool-embeddings-<version>.json`
#[derive(Debug, Clone)]
pub struct FileEmbeddingSnapshot {
    path: PathBuf,
    app_version: String,
}

impl FileEmbeddingSnapshot {
    /// Snapshot for `app_version` inside `dir`
    pub fn new(dir: impl AsRef<Path>, app_version: impl Into<String>) -> Self {
        let app_version = app_version.into();
        let path = dir
            .as_ref()
            .join(format!("tool-embeddings-{}.json", app_version));
        Self { path, app_version }
    }

    /// Snapshot at an explicit path
    pub fn from_path(path: impl Into<PathBuf>, app_version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            app_version: app_version.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a snapshot file for this version (used by build tooling and tests)
    pub fn write(&self, embeddings: HashMap<String, Embedding>) -> EmbeddingResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = SnapshotFile {
            version: self.app_version.clone(),
            kind: Some(EmbeddingKind::default()),
            embeddings,
        };
        fs::write(&self.path, serde_json::to_string(&file)?)?;
        Ok(())
    }
}

#[async_trait]
impl EmbeddingSnapshotSource for FileEmbeddingSnapshot {
    async fn load(&self) -> EmbeddingResult<HashMap<String, Embedding>> {
        let content = fs::read_to_string(&self.path)?;
        let file: SnapshotFile = serde_json::from_str(&content)?;

        if file.version != self.app_version {
            return Err(EmbeddingError::snapshot(format!(
                "snapshot {} was built for version {}, expected {}",
                self.path.display(),
                file.version,
                self.app_version
            )));
        }

        Ok(file.embeddings)
    }
}

/// In-memory snapshot, empty by default
#[derive(Debug, Clone, Default)]
pub struct StaticEmbeddingSnapshot {
    embeddings: HashMap<String, Embedding>,
}

impl StaticEmbeddingSnapshot {
    pub fn new(embeddings: HashMap<String, Embedding>) -> Self {
        Self { embeddings }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmbeddingSnapshotSource for StaticEmbeddingSnapshot {
    async fn load(&self) -> EmbeddingResult<HashMap<String, Embedding>> {
        Ok(self.embeddings.clone())
    }
}
