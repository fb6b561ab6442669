//! # Prune Executor
//!
//! Deletes exactly the ids the caller names. The list is trusted as given:
//! ghosts are not recomputed, so a scan and the prune acting on it may be
//! separated by time, by actor, or by manual curation of the list.

use core_library::{IndexStore, WriteBatch, WriteOp};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{Result, SyncError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneResult {
    /// Distinct ids requested
    pub requested: usize,
    /// Entries actually removed; ids that were already absent do not count
    pub deleted_count: usize,
}

pub struct PruneExecutor {
    store: Arc<dyn IndexStore>,
}

impl PruneExecutor {
    pub fn new(store: Arc<dyn IndexStore>) -> Self {
        Self { store }
    }

    /// Trim, reject blanks and drop duplicates, keeping first-seen order
    pub fn normalize_ids<S: AsRef<str>>(ids: &[S]) -> Result<Vec<String>> {
        if ids.is_empty() {
            return Err(SyncError::InvalidInput {
                field: "ids".to_string(),
                message: "at least one id is required".to_string(),
            });
        }

        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(ids.len());
        for (position, id) in ids.iter().enumerate() {
            let id = id.as_ref().trim();
            if id.is_empty() {
                return Err(SyncError::InvalidInput {
                    field: format!("ids[{}]", position),
                    message: "id must not be blank".to_string(),
                });
            }
            if seen.insert(id.to_string()) {
                normalized.push(id.to_string());
            }
        }
        Ok(normalized)
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn execute<S: AsRef<str> + Send + Sync>(&self, ids: &[S]) -> Result<PruneResult> {
        let ids = Self::normalize_ids(ids)?;
        let batch_size = self.store.max_batch_size().max(1);
        let mut deleted_count = 0;

        for chunk in ids.chunks(batch_size) {
            let ops = chunk.iter().cloned().map(WriteOp::Delete).collect();
            let committed = match WriteBatch::from_ops(ops, batch_size) {
                Ok(batch) => self.store.commit(batch).await,
                Err(e) => Err(e),
            };

            match committed {
                Ok(outcome) => deleted_count += outcome.deleted,
                Err(source) => {
                    warn!(deleted_so_far = deleted_count, error = %source, "Prune batch failed");
                    return Err(SyncError::PruneFailed {
                        deleted_so_far: deleted_count,
                        source,
                    });
                }
            }
        }

        info!(requested = ids.len(), deleted_count, "Prune finished");
        Ok(PruneResult {
            requested: ids.len(),
            deleted_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_dedups() {
        let ids = PruneExecutor::normalize_ids(&[" D ", "E", "D"]).unwrap();
        assert_eq!(ids, vec!["D".to_string(), "E".to_string()]);
    }

    #[test]
    fn test_normalize_rejects_empty_and_blank() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            PruneExecutor::normalize_ids(&empty),
            Err(SyncError::InvalidInput { .. })
        ));

        let err = PruneExecutor::normalize_ids(&["A", "  "]).unwrap_err();
        assert!(matches!(err, SyncError::InvalidInput { ref field, .. } if field == "ids[1]"));
    }
}
