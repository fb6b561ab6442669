//! # Offline Replication
//!
//! Keeps the files referenced by a working set readable without network
//! access. Bytes are fetched through an authenticated [`FileProxy`] and
//! persisted into a host-provided
//! [`OfflineStore`](bridge_traits::storage::OfflineStore).
//!
//! Status is observable through immutable [`OfflineState`] snapshots; see
//! [`OfflineReplicationManager::subscribe`].

pub mod error;
pub mod manager;
pub mod memory_store;
pub mod proxy;
pub mod state;

pub use error::{OfflineError, Result};
pub use manager::{DownloadOutcome, OfflineReplicationManager, SetlistSyncSummary};
pub use memory_store::MemoryOfflineStore;
pub use proxy::{FileProxy, HttpFileProxy, ProxiedFile, DEFAULT_CONTENT_TYPE};
pub use state::{DownloadState, OfflineState, TrackRef};
