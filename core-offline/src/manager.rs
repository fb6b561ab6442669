//! # Offline Replication Manager
//!
//! Caches the files referenced by a working set (a setlist of tracks) so they
//! remain readable without network access.
//!
//! ## State
//!
//! Status is published as immutable [`OfflineState`] snapshots over a
//! `tokio::sync::watch` channel. Each transition builds a new snapshot and
//! swaps it in whole; readers holding an older `Arc` are unaffected.
//!
//! ## Workflow
//!
//! 1. `check_offline_status` reports cache presence for every referenced file
//! 2. `download_file` fetches one file through the [`FileProxy`] unless it is
//!    already cached or already being fetched
//! 3. `sync_setlist` fans out `download_file` over every referenced file not
//!    yet cached; one failure never aborts the others

use bridge_traits::storage::{CachedFile, OfflineStore};
use bridge_traits::time::Clock;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, info, instrument, warn};

use crate::error::{OfflineError, Result};
use crate::proxy::FileProxy;
use crate::state::{DownloadState, OfflineState, TrackRef};

/// Result of a single `download_file` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Fetched and persisted by this call
    Cached,
    /// Already present; nothing was fetched
    AlreadyCached,
    /// Another call is fetching the same id
    AlreadyDownloading,
    /// Fetch or persist failed; the file stays unavailable offline
    Failed(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetlistSyncSummary {
    /// Distinct files that were not yet offline when the sync started
    pub requested: usize,
    pub cached: usize,
    pub failed: usize,
}

pub struct OfflineReplicationManager {
    proxy: Arc<dyn FileProxy>,
    store: Arc<dyn OfflineStore>,
    clock: Arc<dyn Clock>,
    state: watch::Sender<Arc<OfflineState>>,
    download_permits: Option<Arc<Semaphore>>,
}

impl OfflineReplicationManager {
    pub fn new(
        proxy: Arc<dyn FileProxy>,
        store: Arc<dyn OfflineStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state, _) = watch::channel(Arc::new(OfflineState::default()));
        Self {
            proxy,
            store,
            clock,
            state,
            download_permits: None,
        }
    }

    /// Bound the number of fetches in flight; unbounded by default
    pub fn with_max_concurrent_downloads(mut self, limit: usize) -> Self {
        self.download_permits = Some(Arc::new(Semaphore::new(limit.max(1))));
        self
    }

    /// Watch status snapshots
    pub fn subscribe(&self) -> watch::Receiver<Arc<OfflineState>> {
        self.state.subscribe()
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<OfflineState> {
        Arc::clone(&self.state.borrow())
    }

    pub fn state_of(&self, file_id: &str) -> DownloadState {
        self.state.borrow().state_of(file_id)
    }

    /// Report cache presence for every file the tracks reference.
    ///
    /// Presence checks only; nothing is fetched. The result is merged into
    /// the published snapshot. A cache read error counts as not offline.
    #[instrument(skip(self, tracks), fields(tracks = tracks.len()))]
    pub async fn check_offline_status(&self, tracks: &[TrackRef]) -> HashMap<String, bool> {
        let before = self.snapshot();
        let mut status = HashMap::new();
        for id in tracks.iter().flat_map(TrackRef::file_ids) {
            if status.contains_key(id) {
                continue;
            }
            let present = match self.store.has(id).await {
                Ok(present) => present,
                Err(e) => {
                    warn!(file_id = id, error = %e, "Offline presence check failed");
                    false
                }
            };
            status.insert(id.to_string(), present);
        }

        // An absent result never overrides a transition made while checking
        self.state.send_if_modified(|current| {
            let updates: Vec<(&String, bool)> = status
                .iter()
                .filter(|(id, present)| {
                    let id = id.as_str();
                    **present
                        || (!current.downloading.contains(id)
                            && current.offline.get(id) == before.offline.get(id))
                })
                .filter(|(id, present)| current.offline.get(id.as_str()) != Some(*present))
                .map(|(id, present)| (id, *present))
                .collect();
            if updates.is_empty() {
                return false;
            }
            let mut next = OfflineState::clone(current);
            next.offline
                .extend(updates.into_iter().map(|(id, present)| (id.clone(), present)));
            *current = Arc::new(next);
            true
        });

        debug!(
            checked = status.len(),
            offline = status.values().filter(|p| **p).count(),
            "Offline status checked"
        );
        status
    }

    /// Fetch one file through the proxy and persist it locally.
    ///
    /// No fetch is issued when the id is already marked offline, already
    /// present in the cache, or already being fetched.
    #[instrument(skip(self, file_name), fields(file_id = %file_id))]
    pub async fn download_file(&self, file_id: &str, file_name: &str) -> DownloadOutcome {
        let mut blocked = None;
        self.state.send_if_modified(|current| {
            if current.is_offline(file_id) {
                blocked = Some(DownloadOutcome::AlreadyCached);
                return false;
            }
            if current.downloading.contains(file_id) {
                blocked = Some(DownloadOutcome::AlreadyDownloading);
                return false;
            }
            let mut next = OfflineState::clone(current);
            next.downloading.insert(file_id.to_string());
            *current = Arc::new(next);
            true
        });
        if let Some(outcome) = blocked {
            debug!(?outcome, "Skipping download");
            return outcome;
        }
        let guard = DownloadGuard {
            manager: self,
            file_id,
            armed: true,
        };

        if matches!(self.store.has(file_id).await, Ok(true)) {
            guard.finish(true);
            debug!("File already in offline cache");
            return DownloadOutcome::AlreadyCached;
        }

        match self.fetch_and_persist(file_id, file_name).await {
            Ok(size) => {
                guard.finish(true);
                info!(size, "File cached for offline use");
                DownloadOutcome::Cached
            }
            Err(e) => {
                guard.finish(false);
                warn!(error = %e, "Offline download failed");
                DownloadOutcome::Failed(e.to_string())
            }
        }
    }

    /// Make every file the tracks reference available offline.
    ///
    /// Downloads run concurrently, bounded by the configured permit count.
    /// Individual failures are counted, never propagated.
    #[instrument(skip(self, tracks), fields(tracks = tracks.len()))]
    pub async fn sync_setlist(&self, tracks: &[TrackRef]) -> SetlistSyncSummary {
        let snapshot = self.snapshot();
        let mut pending: BTreeMap<&str, &str> = BTreeMap::new();
        for track in tracks {
            for id in track.file_ids() {
                if !snapshot.is_offline(id) {
                    pending.entry(id).or_insert(track.title.as_str());
                }
            }
        }

        let outcomes = join_all(
            pending
                .iter()
                .map(|(id, name)| self.download_file(id, name)),
        )
        .await;

        let summary = outcomes.iter().fold(
            SetlistSyncSummary {
                requested: pending.len(),
                ..Default::default()
            },
            |mut summary, outcome| {
                match outcome {
                    DownloadOutcome::Cached | DownloadOutcome::AlreadyCached => {
                        summary.cached += 1
                    }
                    DownloadOutcome::Failed(_) => summary.failed += 1,
                    DownloadOutcome::AlreadyDownloading => {}
                }
                summary
            },
        );

        info!(
            requested = summary.requested,
            cached = summary.cached,
            failed = summary.failed,
            "Setlist sync finished"
        );
        summary
    }

    async fn fetch_and_persist(&self, file_id: &str, file_name: &str) -> Result<usize> {
        let _permit = match &self.download_permits {
            Some(permits) => Some(
                Arc::clone(permits)
                    .acquire_owned()
                    .await
                    .map_err(|e| OfflineError::Cache(e.to_string()))?,
            ),
            None => None,
        };

        let file = self.proxy.fetch(file_id).await?;
        let size = file.bytes.len();
        let sha256 = hex::encode(Sha256::digest(&file.bytes));

        self.store
            .put(CachedFile {
                file_id: file_id.to_string(),
                bytes: file.bytes,
                file_name: file_name.to_string(),
                mime_type: file.content_type,
                sha256,
                saved_at: self.clock.now(),
            })
            .await
            .map_err(|e| OfflineError::Cache(e.to_string()))?;

        Ok(size)
    }

    /// Leave the downloading set; on success also mark the id offline
    fn finish(&self, file_id: &str, cached: bool) {
        self.state.send_modify(|current| {
            let mut next = OfflineState::clone(current);
            next.downloading.remove(file_id);
            if cached {
                next.offline.insert(file_id.to_string(), true);
            }
            *current = Arc::new(next);
        });
    }
}

/// Takes an id out of the downloading set even when the download future is
/// dropped before completion, so a cancelled fetch stays retryable
struct DownloadGuard<'a> {
    manager: &'a OfflineReplicationManager,
    file_id: &'a str,
    armed: bool,
}

impl DownloadGuard<'_> {
    fn finish(mut self, cached: bool) {
        self.armed = false;
        self.manager.finish(self.file_id, cached);
    }
}

impl Drop for DownloadGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(file_id = self.file_id, "Download abandoned");
            self.manager.finish(self.file_id, false);
        }
    }
}
