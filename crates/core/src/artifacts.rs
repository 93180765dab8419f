//! Storage for completed job results ("movables"), keyed by id0.
//!
//! A second completion under the same id0 replaces the first artifact.
//! Nothing is ever expired here.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::id0::Id0;
use crate::types::Timestamp;

/// File extension used for stored movables.
pub const ARTIFACT_EXTENSION: &str = "sed";

/// Reference to a stored artifact, recorded on the completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRef {
    pub size_bytes: usize,
    pub stored_at: Timestamp,
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ArtifactError> for CoreError {
    fn from(err: ArtifactError) -> Self {
        CoreError::Internal(err.to_string())
    }
}

/// Persistent store for completed artifacts.
///
/// Implementations must tolerate concurrent writes to distinct keys.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `bytes` under `id0`, overwriting any previous artifact.
    async fn put(&self, id0: &Id0, bytes: &[u8]) -> Result<ArtifactRef, ArtifactError>;

    /// Fetch the artifact for `id0`, or `None` if nothing was stored.
    async fn get(&self, id0: &Id0) -> Result<Option<Vec<u8>>, ArtifactError>;

    /// Number of stored artifacts. Used to seed the completed counter.
    async fn count(&self) -> Result<usize, ArtifactError>;
}

// ---------------------------------------------------------------------------
// Filesystem store
// ---------------------------------------------------------------------------

/// Stores each artifact as `<root>/<id0>.sed`.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    /// Open (and create if needed) the artifact directory.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id0: &Id0) -> PathBuf {
        self.root.join(format!("{id0}.{ARTIFACT_EXTENSION}"))
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put(&self, id0: &Id0, bytes: &[u8]) -> Result<ArtifactRef, ArtifactError> {
        let path = self.path_for(id0);
        // Write then rename so a concurrent download never sees a partial file.
        let tmp = path.with_extension(format!("{ARTIFACT_EXTENSION}.tmp"));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        Ok(ArtifactRef {
            size_bytes: bytes.len(),
            stored_at: Utc::now(),
        })
    }

    async fn get(&self, id0: &Id0) -> Result<Option<Vec<u8>>, ArtifactError> {
        match tokio::fs::read(self.path_for(id0)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn count(&self) -> Result<usize, ArtifactError> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXTENSION)
                && entry.file_type().await?.is_file()
            {
                count += 1;
            }
        }
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Non-persistent store, used by tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<HashMap<Id0, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, id0: &Id0, bytes: &[u8]) -> Result<ArtifactRef, ArtifactError> {
        self.artifacts
            .write()
            .await
            .insert(id0.clone(), bytes.to_vec());
        Ok(ArtifactRef {
            size_bytes: bytes.len(),
            stored_at: Utc::now(),
        })
    }

    async fn get(&self, id0: &Id0) -> Result<Option<Vec<u8>>, ArtifactError> {
        Ok(self.artifacts.read().await.get(id0).cloned())
    }

    async fn count(&self) -> Result<usize, ArtifactError> {
        Ok(self.artifacts.read().await.len())
    }
}
