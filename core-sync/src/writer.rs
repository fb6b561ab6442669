//! # Index Writer
//!
//! Merge-upserts the enumerated descriptors into the index in bounded
//! batches.
//!
//! Batches commit sequentially and each one is atomic. A failed batch is
//! counted in [`SyncStats::errors`] and the run moves on; batches already
//! committed stay committed. Enumeration failure aborts before any write.
//!
//! The writer never deletes. Removing entries whose files are gone is the job
//! of the scanner and the prune executor, so `deleted` is always zero here.

use bridge_traits::time::Clock;
use core_library::{FileDescriptor, IndexEntry, IndexStore, WriteBatch, WriteOp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::enumerator::RemoteEnumerator;
use crate::error::Result;

/// Result of one sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    /// Descriptors returned by the enumerator
    pub total_scanned: usize,
    /// Ids that were not yet indexed
    pub added: usize,
    /// Ids that were already indexed and got merged
    pub updated: usize,
    /// Always 0 from this path
    pub deleted: usize,
    /// Failed batch commits
    pub errors: usize,
    /// Batches attempted
    pub batches: usize,
    pub duration_ms: u64,
}

/// Batch size used unless overridden, kept below the store hard limit
pub const DEFAULT_BATCH_SIZE: usize = 450;

pub struct IndexWriter {
    enumerator: Arc<RemoteEnumerator>,
    store: Arc<dyn IndexStore>,
    clock: Arc<dyn Clock>,
    batch_size: usize,
    source_tag: String,
}

impl IndexWriter {
    pub fn new(
        enumerator: Arc<RemoteEnumerator>,
        store: Arc<dyn IndexStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let batch_size = DEFAULT_BATCH_SIZE.min(store.max_batch_size()).max(1);
        Self {
            enumerator,
            store,
            clock,
            batch_size,
            source_tag: "google-drive".to_string(),
        }
    }

    /// Requested batch size, clamped to the store's hard limit
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.clamp(1, self.store.max_batch_size().max(1));
        self
    }

    pub fn with_source_tag(mut self, tag: impl Into<String>) -> Self {
        self.source_tag = tag.into();
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Enumerate the external store and upsert everything into the index
    #[instrument(skip(self), fields(root_id = ?root_id))]
    pub async fn sync_library_index(&self, root_id: Option<&str>) -> Result<SyncStats> {
        let started = Instant::now();
        let descriptors = self.enumerator.list_all_files(root_id).await?;

        let mut stats = self.write_descriptors(descriptors).await;
        stats.duration_ms = started.elapsed().as_millis() as u64;

        info!(
            total_scanned = stats.total_scanned,
            added = stats.added,
            updated = stats.updated,
            errors = stats.errors,
            batches = stats.batches,
            duration_ms = stats.duration_ms,
            "Library index sync finished"
        );
        Ok(stats)
    }

    /// Upsert an already complete descriptor set
    pub async fn write_descriptors(&self, descriptors: Vec<FileDescriptor>) -> SyncStats {
        let synced_at = self.clock.now();
        let mut stats = SyncStats {
            total_scanned: descriptors.len(),
            ..SyncStats::default()
        };

        let mut ops = descriptors.into_iter().map(|descriptor| {
            WriteOp::Upsert(IndexEntry::from_descriptor(
                descriptor,
                self.source_tag.clone(),
                synced_at,
            ))
        });

        loop {
            let chunk: Vec<WriteOp> = ops.by_ref().take(self.batch_size).collect();
            if chunk.is_empty() {
                break;
            }
            stats.batches += 1;
            let ops_in_batch = chunk.len();

            let committed = match WriteBatch::from_ops(chunk, self.batch_size) {
                Ok(batch) => self.store.commit(batch).await,
                Err(e) => Err(e),
            };

            match committed {
                Ok(outcome) => {
                    stats.added += outcome.inserted;
                    stats.updated += outcome.updated;
                }
                Err(e) => {
                    stats.errors += 1;
                    warn!(batch = stats.batches, ops = ops_in_batch, error = %e, "Batch commit failed, continuing");
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::time::FixedClock;
    use chrono::{TimeZone, Utc};
    use core_library::MemoryIndexStore;

    struct NoProvider;

    #[async_trait::async_trait]
    impl bridge_traits::StorageProvider for NoProvider {
        async fn list_children(
            &self,
            _folder_id: Option<&str>,
            _page_token: Option<String>,
        ) -> bridge_traits::error::Result<bridge_traits::RemotePage> {
            Ok(Default::default())
        }

        async fn get_metadata(
            &self,
            file_id: &str,
        ) -> bridge_traits::error::Result<bridge_traits::RemoteFile> {
            Err(bridge_traits::BridgeError::NotFound(file_id.to_string()))
        }

        async fn download(
            &self,
            file_id: &str,
            _range: Option<&str>,
        ) -> bridge_traits::error::Result<bridge_traits::RemoteContent> {
            Err(bridge_traits::BridgeError::NotFound(file_id.to_string()))
        }
    }

    fn writer(store: Arc<MemoryIndexStore>) -> IndexWriter {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
        IndexWriter::new(
            Arc::new(RemoteEnumerator::new(Arc::new(NoProvider))),
            store,
            Arc::new(clock),
        )
    }

    #[test]
    fn test_batch_size_is_clamped_to_store_limit() {
        let store = Arc::new(MemoryIndexStore::new(500));
        assert_eq!(writer(store.clone()).batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(writer(Arc::new(MemoryIndexStore::new(100))).batch_size(), 100);
        assert_eq!(writer(store.clone()).with_batch_size(500).batch_size(), 500);
        assert_eq!(writer(store.clone()).with_batch_size(900).batch_size(), 500);
        assert_eq!(writer(store).with_batch_size(0).batch_size(), 1);
    }

    #[tokio::test]
    async fn test_stamps_source_and_sync_time() {
        let store = Arc::new(MemoryIndexStore::new(500));
        let writer = writer(store.clone()).with_source_tag("drive-test");

        let stats = writer
            .write_descriptors(vec![FileDescriptor::new("f1", "A.pdf", "application/pdf")])
            .await;

        assert_eq!(stats.added, 1);
        let entry = store.get("f1").await.unwrap().unwrap();
        assert_eq!(entry.source, "drive-test");
        assert_eq!(
            entry.last_synced_at,
            Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_empty_listing_commits_nothing() {
        let store = Arc::new(MemoryIndexStore::new(500));

        let stats = writer(store).sync_library_index(None).await.unwrap();

        assert_eq!(stats.total_scanned, 0);
        assert_eq!(stats.batches, 0);
        assert_eq!(stats.deleted, 0);
    }
}
