//! # Authentication Boundary
//!
//! Identity checks for the operator routes (sync, scan, prune).
//!
//! Session credentials are issued and decoded elsewhere. This crate defines
//! the [`IdentityVerifier`] seam, the [`CallerIdentity`] it yields, and the
//! admin-role gate applied before any index work starts.

pub mod error;
pub mod types;
pub mod verifier;

pub use error::{AuthError, Result};
pub use types::{CallerIdentity, Role};
pub use verifier::{bearer_from_header, require_operator, IdentityVerifier, StaticTokenVerifier};
