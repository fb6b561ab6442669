use bridge_traits::error::BridgeError;
use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Listing the external store failed; nothing was written
    #[error("Enumeration failed: {0}")]
    Provider(#[from] BridgeError),

    #[error("Index error: {0}")]
    Library(#[from] LibraryError),

    /// The provider handed back a page token it already returned
    #[error("Pagination loop while listing {scope}: token {token} repeated")]
    PaginationLoop { scope: String, token: String },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    /// A prune batch failed; earlier batches stay committed
    #[error("Prune failed after deleting {deleted_so_far} entries: {source}")]
    PruneFailed {
        deleted_so_far: usize,
        #[source]
        source: LibraryError,
    },

    #[error("Failed to write scan report: {0}")]
    Report(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
