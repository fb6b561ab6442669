//! Workspace umbrella crate.
//!
//! Exposes feature flags that map to the individual workspace crates so a
//! host can depend on `library-sync-workspace` alone:
//!
//! - `desktop-shims`: the operator façade from `core-service`, wired to
//!   reqwest, Google Drive and SQLite
//! - `offline`: offline replication from `core-offline`

#[cfg(feature = "desktop-shims")]
pub use core_service::{
    bootstrap_desktop, CoreError, LibraryDependencies, LibraryService, ScanResponse,
};

#[cfg(all(feature = "desktop-shims", feature = "offline"))]
pub use core_service::build_offline_manager;

#[cfg(feature = "offline")]
pub use core_offline::{
    DownloadOutcome, DownloadState, OfflineReplicationManager, OfflineState,
    SetlistSyncSummary, TrackRef,
};
