//! Index store abstraction
//!
//! The index store accepts bounded batches of write operations, each committed
//! atomically. Upserts merge: only sync-owned fields are written on an
//! existing entry (see [`IndexEntry::merge_sync_fields`]).

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{LibraryError, Result};
use crate::models::IndexEntry;

/// One write against the index
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Merge-upsert keyed by `entry.id`
    Upsert(IndexEntry),
    /// Delete by id; deleting a missing id is not an error
    Delete(String),
}

impl WriteOp {
    pub fn id(&self) -> &str {
        match self {
            WriteOp::Upsert(entry) => &entry.id,
            WriteOp::Delete(id) => id,
        }
    }
}

/// Operations committed together, never more than `limit`
#[derive(Debug, Clone)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
    limit: usize,
}

impl WriteBatch {
    pub fn new(limit: usize) -> Self {
        Self {
            ops: Vec::new(),
            limit,
        }
    }

    /// Build a batch from `ops`, failing if there are more than `limit`
    pub fn from_ops(ops: Vec<WriteOp>, limit: usize) -> Result<Self> {
        if ops.len() > limit {
            return Err(LibraryError::BatchTooLarge {
                len: ops.len(),
                limit,
            });
        }
        Ok(Self { ops, limit })
    }

    pub fn push(&mut self, op: WriteOp) -> Result<()> {
        if self.ops.len() >= self.limit {
            return Err(LibraryError::BatchTooLarge {
                len: self.ops.len() + 1,
                limit: self.limit,
            });
        }
        self.ops.push(op);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// What a committed batch changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Upserts that created a new entry
    pub inserted: usize,
    /// Upserts that merged into an existing entry
    pub updated: usize,
    /// Deletes that removed an entry
    pub deleted: usize,
}

/// Batched-write index store
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Hard limit on operations per [`commit`](IndexStore::commit)
    fn max_batch_size(&self) -> usize;

    /// Apply every operation in `batch` atomically: all or none
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::BatchTooLarge`] without writing anything if the
    /// batch exceeds [`max_batch_size`](IndexStore::max_batch_size).
    async fn commit(&self, batch: WriteBatch) -> Result<BatchOutcome>;

    /// Read every entry
    async fn load_all(&self) -> Result<Vec<IndexEntry>>;

    async fn get(&self, id: &str) -> Result<Option<IndexEntry>>;

    async fn count(&self) -> Result<usize>;
}

pub(crate) fn check_batch_size(batch: &WriteBatch, limit: usize) -> Result<()> {
    if batch.len() > limit {
        return Err(LibraryError::BatchTooLarge {
            len: batch.len(),
            limit,
        });
    }
    Ok(())
}

/// In-memory [`IndexStore`]
pub struct MemoryIndexStore {
    entries: RwLock<BTreeMap<String, IndexEntry>>,
    max_batch_size: usize,
}

impl MemoryIndexStore {
    pub fn new(max_batch_size: usize) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            max_batch_size,
        }
    }

    /// Seed entries directly, bypassing batching
    pub async fn seed(&self, entries: impl IntoIterator<Item = IndexEntry>) {
        let mut map = self.entries.write().await;
        for entry in entries {
            map.insert(entry.id.clone(), entry);
        }
    }
}

impl Default for MemoryIndexStore {
    fn default() -> Self {
        Self::new(500)
    }
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    async fn commit(&self, batch: WriteBatch) -> Result<BatchOutcome> {
        check_batch_size(&batch, self.max_batch_size)?;

        let mut entries = self.entries.write().await;
        let mut outcome = BatchOutcome::default();

        for op in batch.into_ops() {
            match op {
                WriteOp::Upsert(incoming) => match entries.get_mut(&incoming.id) {
                    Some(existing) => {
                        existing.merge_sync_fields(&incoming);
                        outcome.updated += 1;
                    }
                    None => {
                        entries.insert(incoming.id.clone(), incoming);
                        outcome.inserted += 1;
                    }
                },
                WriteOp::Delete(id) => {
                    if entries.remove(&id).is_some() {
                        outcome.deleted += 1;
                    }
                }
            }
        }

        debug!(
            inserted = outcome.inserted,
            updated = outcome.updated,
            deleted = outcome.deleted,
            "Committed batch to memory index"
        );
        Ok(outcome)
    }

    async fn load_all(&self) -> Result<Vec<IndexEntry>> {
        Ok(self.entries.read().await.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<IndexEntry>> {
        Ok(self.entries.read().await.get(id).cloned())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileDescriptor;
    use chrono::Utc;

    fn entry(id: &str, name: &str) -> IndexEntry {
        IndexEntry::from_descriptor(
            FileDescriptor::new(id, name, "application/pdf"),
            "google-drive",
            Utc::now(),
        )
    }

    #[test]
    fn test_batch_limit() {
        let mut batch = WriteBatch::new(2);
        batch.push(WriteOp::Delete("a".to_string())).unwrap();
        batch.push(WriteOp::Delete("b".to_string())).unwrap();

        let err = batch.push(WriteOp::Delete("c".to_string())).unwrap_err();
        assert!(matches!(err, LibraryError::BatchTooLarge { len: 3, limit: 2 }));

        let ops = vec![WriteOp::Delete("x".to_string()); 3];
        assert!(WriteBatch::from_ops(ops, 2).is_err());
    }

    #[tokio::test]
    async fn test_store_rejects_oversized_batch() {
        let store = MemoryIndexStore::new(1);
        let batch = WriteBatch::from_ops(
            vec![
                WriteOp::Upsert(entry("a", "A")),
                WriteOp::Upsert(entry("b", "B")),
            ],
            10,
        )
        .unwrap();

        assert!(store.commit(batch).await.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_counts_inserted_and_updated() {
        let store = MemoryIndexStore::default();
        let first = WriteBatch::from_ops(vec![WriteOp::Upsert(entry("a", "A"))], 500).unwrap();
        assert_eq!(store.commit(first).await.unwrap().inserted, 1);

        let second = WriteBatch::from_ops(
            vec![
                WriteOp::Upsert(entry("a", "A2")),
                WriteOp::Upsert(entry("b", "B")),
            ],
            500,
        )
        .unwrap();
        let outcome = store.commit(second).await.unwrap();

        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.updated, 1);
        assert_eq!(store.get("a").await.unwrap().unwrap().name, "A2");
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_not_counted() {
        let store = MemoryIndexStore::default();
        store.seed([entry("a", "A")]).await;

        let batch = WriteBatch::from_ops(
            vec![
                WriteOp::Delete("a".to_string()),
                WriteOp::Delete("zzz".to_string()),
            ],
            500,
        )
        .unwrap();
        let outcome = store.commit(batch).await.unwrap();

        assert_eq!(outcome.deleted, 1);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
