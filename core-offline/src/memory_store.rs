use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::storage::{CachedFile, OfflineStore};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local [`OfflineStore`], for tests and hosts without a disk cache
#[derive(Default)]
pub struct MemoryOfflineStore {
    entries: RwLock<HashMap<String, CachedFile>>,
}

impl MemoryOfflineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl OfflineStore for MemoryOfflineStore {
    async fn put(&self, entry: CachedFile) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(entry.file_id.clone(), entry);
        Ok(())
    }

    async fn get(&self, file_id: &str) -> Result<Option<CachedFile>> {
        Ok(self.entries.read().await.get(file_id).cloned())
    }

    async fn has(&self, file_id: &str) -> Result<bool> {
        Ok(self.entries.read().await.contains_key(file_id))
    }

    async fn remove(&self, file_id: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(file_id).is_some())
    }
}
