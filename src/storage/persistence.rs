//! JSON snapshot file backing a durable [`MemoryStore`](super::MemoryStore).

use crate::core::{EntityInstance, EntityKind, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracing::debug;

pub type Collections = BTreeMap<EntityKind, Vec<EntityInstance>>;

// ============================================================================
// Store Snapshot
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub collections: Collections,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: u64,
    pub document_count: usize,
}

impl StoreSnapshot {
    pub const VERSION: u32 = 1;

    pub fn new(collections: Collections) -> Self {
        let document_count = collections.values().map(Vec::len).sum();
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default();

        Self {
            version: Self::VERSION,
            collections,
            metadata: SnapshotMetadata {
                created_at,
                document_count,
            },
        }
    }
}

// ============================================================================
// Snapshot File
// ============================================================================

#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Reads the file, or returns `None` when nothing has been written yet.
    pub async fn load(&self) -> StoreResult<Option<Collections>> {
        if !self.exists().await {
            return Ok(None);
        }

        let bytes = fs::read(&self.path).await.map_err(|err| {
            StoreError::unavailable(format!(
                "Failed to read snapshot '{}': {}",
                self.path.display(),
                err
            ))
        })?;
        let snapshot: StoreSnapshot = serde_json::from_slice(&bytes).map_err(|err| {
            StoreError::unavailable(format!(
                "Corrupt snapshot '{}': {}",
                self.path.display(),
                err
            ))
        })?;

        if snapshot.version != StoreSnapshot::VERSION {
            return Err(StoreError::unavailable(format!(
                "Unsupported snapshot version {} in '{}'",
                snapshot.version,
                self.path.display()
            )));
        }

        debug!(
            path = %self.path.display(),
            documents = snapshot.metadata.document_count,
            "loaded store snapshot"
        );
        Ok(Some(snapshot.collections))
    }

    /// Writes the collections atomically: temp file first, then rename.
    pub async fn save(&self, collections: &Collections) -> StoreResult<()> {
        let snapshot = StoreSnapshot::new(collections.clone());
        let bytes = serde_json::to_vec_pretty(&snapshot)
            .map_err(|err| StoreError::unavailable(format!("Failed to encode snapshot: {}", err)))?;
        atomic_write(&self.path, &bytes).await
    }
}

async fn atomic_write(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(|err| {
            StoreError::unavailable(format!(
                "Failed to create parent directory '{}': {}",
                parent.display(),
                err
            ))
        })?;
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).await.map_err(|err| {
        StoreError::unavailable(format!(
            "Failed to write temp file '{}': {}",
            tmp.display(),
            err
        ))
    })?;

    fs::rename(&tmp, path).await.map_err(|err| {
        StoreError::unavailable(format!(
            "Failed to rename temp file '{}' -> '{}': {}",
            tmp.display(),
            path.display(),
            err
        ))
    })
}
