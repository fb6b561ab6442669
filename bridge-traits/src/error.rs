use thiserror::Error;

/// Failure crossing the host boundary
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The capability is missing or could not be initialized
    #[error("Capability not available: {0}")]
    NotAvailable(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// The external store has no item with this id
    #[error("Not found in external store: {0}")]
    NotFound(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, BridgeError::Timeout(_) | BridgeError::OperationFailed(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
