use bridge_traits::error::BridgeError;
use core_auth::AuthError;
use core_sync::SyncError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("Library error: {0}")]
    Library(#[from] core_library::LibraryError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// The route exceeded its maximum execution duration
    #[error("{route} did not finish within {}s", after.as_secs_f64())]
    Timeout { route: &'static str, after: Duration },
}

impl CoreError {
    /// HTTP-style status for route handlers
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::Auth(AuthError::NotAuthenticated)
            | CoreError::Auth(AuthError::InvalidCredential(_)) => 401,
            CoreError::Auth(AuthError::Forbidden { .. }) => 403,
            CoreError::Sync(SyncError::InvalidInput { .. }) => 400,
            CoreError::Timeout { .. } => 504,
            _ => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
