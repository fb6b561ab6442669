//! # Consistency Scanner
//!
//! Computes `indexed ids − external ids` and reports the difference as
//! ghosts. Read-only: the scanner never writes the index. Acting on a report
//! is a separate, explicit call to the
//! [`PruneExecutor`](crate::prune::PruneExecutor).

use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use core_library::{Ghost, IndexStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::enumerator::RemoteEnumerator;
use crate::error::{Result, SyncError};

/// Outcome of one scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub report_id: Uuid,
    pub scanned_at: DateTime<Utc>,
    /// Files found in the external store
    pub drive_count: usize,
    /// Entries in the index
    pub db_count: usize,
    pub ghost_count: usize,
    /// Sorted by id
    pub ghosts: Vec<Ghost>,
}

impl ScanReport {
    pub fn ghost_ids(&self) -> Vec<String> {
        self.ghosts.iter().map(|g| g.id.clone()).collect()
    }

    pub fn file_name(&self) -> String {
        format!("scan-{}.json", self.report_id)
    }

    /// Persist the report as `scan-<report_id>.json` under `dir`
    pub async fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| SyncError::Report(format!("{}: {}", dir.display(), e)))?;

        let path = dir.join(self.file_name());
        let json =
            serde_json::to_vec_pretty(self).map_err(|e| SyncError::Report(e.to_string()))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| SyncError::Report(format!("{}: {}", path.display(), e)))?;

        Ok(path)
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| SyncError::Report(format!("{}: {}", path.display(), e)))?;
        serde_json::from_slice(&raw).map_err(|e| SyncError::Report(e.to_string()))
    }
}

pub struct ConsistencyScanner {
    enumerator: Arc<RemoteEnumerator>,
    store: Arc<dyn IndexStore>,
    clock: Arc<dyn Clock>,
}

impl ConsistencyScanner {
    pub fn new(
        enumerator: Arc<RemoteEnumerator>,
        store: Arc<dyn IndexStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            enumerator,
            store,
            clock,
        }
    }

    #[instrument(skip(self), fields(root_id = ?root_id))]
    pub async fn scan(&self, root_id: Option<&str>) -> Result<ScanReport> {
        let external = self.enumerator.list_all_files(root_id).await?;
        let external_ids: HashSet<&str> = external.iter().map(|f| f.id.as_str()).collect();

        let indexed = self.store.load_all().await?;

        let mut ghosts: Vec<Ghost> = indexed
            .iter()
            .filter(|entry| !external_ids.contains(entry.id.as_str()))
            .map(|entry| entry.to_ghost())
            .collect();
        ghosts.sort_by(|a, b| a.id.cmp(&b.id));

        let report = ScanReport {
            report_id: Uuid::new_v4(),
            scanned_at: self.clock.now(),
            drive_count: external_ids.len(),
            db_count: indexed.len(),
            ghost_count: ghosts.len(),
            ghosts,
        };

        info!(
            report_id = %report.report_id,
            drive_count = report.drive_count,
            db_count = report.db_count,
            ghost_count = report.ghost_count,
            "Consistency scan finished"
        );
        Ok(report)
    }
}
