use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer credential was presented
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Credential was presented but could not be verified
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Caller is known but lacks the required role
    #[error("Forbidden: {subject} lacks role {required}")]
    Forbidden { subject: String, required: String },

    /// Verification backend could not be reached
    #[error("Identity verification unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
