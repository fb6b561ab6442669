use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OfflineError {
    /// The file proxy answered with a non-success status
    #[error("File proxy returned {status} for {file_id}: {message}")]
    Proxy {
        file_id: String,
        status: u16,
        message: String,
    },

    /// No session token is available for the proxy
    #[error("No active session for the file proxy")]
    NoSession,

    #[error("Transport error: {0}")]
    Transport(#[from] BridgeError),

    /// The local cache refused or failed the write
    #[error("Offline cache error: {0}")]
    Cache(String),
}

pub type Result<T> = std::result::Result<T, OfflineError>;
