//! # Library Index Synchronization
//!
//! Keeps the local index in step with the external file store.
//!
//! ## Components
//!
//! - [`RemoteEnumerator`]: complete, deduplicated listing of the external store
//! - [`IndexWriter`]: batched merge-upserts, producing [`SyncStats`]
//! - [`ConsistencyScanner`]: read-only ghost detection, producing a [`ScanReport`]
//! - [`PruneExecutor`]: deletes an explicit id list
//!
//! ## Two-phase deletion
//!
//! Sync never deletes. Ghosts surface through a scan, are reviewed, and only
//! then are removed by a separate prune call carrying exact ids. A listing
//! that silently came back short can therefore never wipe the index.

pub mod enumerator;
pub mod error;
pub mod prune;
pub mod scanner;
pub mod writer;

pub use enumerator::RemoteEnumerator;
pub use error::{Result, SyncError};
pub use prune::{PruneExecutor, PruneResult};
pub use scanner::{ConsistencyScanner, ScanReport};
pub use writer::{IndexWriter, SyncStats, DEFAULT_BATCH_SIZE};
