use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GoogleDriveError {
    /// Access token rejected (401/403)
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Google Drive API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Rate limit still exceeded after all retries
    #[error("Rate limit exceeded after {attempts} attempts")]
    RateLimitExceeded { attempts: u32 },

    #[error("File not found: {file_id}")]
    FileNotFound { file_id: String },

    /// Drive reported that the listing does not cover every item
    #[error("Listing is incomplete for scope {scope}")]
    IncompleteListing { scope: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, GoogleDriveError>;

impl From<GoogleDriveError> for BridgeError {
    fn from(error: GoogleDriveError) -> Self {
        match error {
            GoogleDriveError::FileNotFound { file_id } => BridgeError::NotFound(file_id),
            rate_limited @ GoogleDriveError::RateLimitExceeded { .. } => {
                BridgeError::Timeout(rate_limited.to_string())
            }
            GoogleDriveError::BridgeError(e) => e,
            other => BridgeError::OperationFailed(other.to_string()),
        }
    }
}
