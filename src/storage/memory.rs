use super::engine::{DocumentStore, sort_for_listing};
use super::persistence::{Collections, SnapshotFile};
use crate::core::{EntityInstance, EntityKind, Fields, ID_FIELD, StoreError, StoreResult};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// In-process document store.
///
/// Collections keep insertion order; listings are sorted on the way out. When
/// opened on a file, every mutation is written through before it becomes
/// visible, so a failed write leaves the store unchanged.
pub struct MemoryStore {
    collections: RwLock<Collections>,
    file: Option<SnapshotFile>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(Collections::new()),
            file: None,
            available: AtomicBool::new(true),
        }
    }

    /// Opens a durable store backed by a JSON snapshot file.
    pub async fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let file = SnapshotFile::new(path);
        let collections = file.load().await?.unwrap_or_default();
        debug!(path = %file.path().display(), "opened file-backed store");

        Ok(Self {
            collections: RwLock::new(collections),
            file: Some(file),
            available: AtomicBool::new(true),
        })
    }

    /// Simulates a backend outage: while unavailable every call fails with
    /// `StoreUnavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn len(&self, kind: EntityKind) -> usize {
        self.collections
            .read()
            .await
            .get(&kind)
            .map(Vec::len)
            .unwrap_or_default()
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::unavailable("backend is offline"))
        }
    }

    /// Applies `mutation` to a copy of the collections, persists it, then
    /// publishes it.
    async fn mutate<T>(
        &self,
        mutation: impl FnOnce(&mut Collections) -> StoreResult<T>,
    ) -> StoreResult<T> {
        self.ensure_available()?;

        let mut guard = self.collections.write().await;
        let mut next = guard.clone();
        let result = mutation(&mut next)?;

        if let Some(file) = &self.file {
            if let Err(err) = file.save(&next).await {
                warn!(error = %err, "snapshot write failed, mutation discarded");
                return Err(err);
            }
        }

        *guard = next;
        Ok(result)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn without_id(fields: Fields) -> Fields {
    fields
        .into_iter()
        .filter(|(name, _)| name != ID_FIELD)
        .collect()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_all(&self, kind: EntityKind) -> StoreResult<Vec<EntityInstance>> {
        self.ensure_available()?;

        let mut instances = self
            .collections
            .read()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default();
        sort_for_listing(kind, &mut instances);
        Ok(instances)
    }

    async fn insert(&self, kind: EntityKind, fields: Fields) -> StoreResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        let instance = EntityInstance::new(id.clone(), without_id(fields));

        self.mutate(|collections| {
            collections.entry(kind).or_default().push(instance);
            Ok(())
        })
        .await?;

        debug!(%kind, %id, "document inserted");
        Ok(id)
    }

    async fn update(&self, kind: EntityKind, id: &str, fields: Fields) -> StoreResult<()> {
        self.mutate(|collections| {
            let instance = collections
                .get_mut(&kind)
                .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
                .ok_or_else(|| StoreError::not_found(kind, id))?;
            instance.fields = without_id(fields);
            Ok(())
        })
        .await?;

        debug!(%kind, %id, "document updated");
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> StoreResult<()> {
        self.mutate(|collections| {
            let docs = collections
                .get_mut(&kind)
                .ok_or_else(|| StoreError::not_found(kind, id))?;
            let position = docs
                .iter()
                .position(|doc| doc.id == id)
                .ok_or_else(|| StoreError::not_found(kind, id))?;
            docs.remove(position);
            Ok(())
        })
        .await?;

        debug!(%kind, %id, "document deleted");
        Ok(())
    }
}
