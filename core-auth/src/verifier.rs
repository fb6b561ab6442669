//! Bearer credential verification
//!
//! The engine never decodes session credentials itself. A host supplies an
//! [`IdentityVerifier`] (backed by its identity provider); the operator
//! routes then gate on [`require_operator`].

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::{AuthError, Result};
use crate::types::{CallerIdentity, Role};

/// Decodes a bearer credential into the caller's identity and role
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `bearer` (without the `Bearer ` prefix)
    async fn verify(&self, bearer: &str) -> Result<CallerIdentity>;
}

/// Strip an optional `Bearer ` scheme prefix from an Authorization value
pub fn bearer_from_header(value: &str) -> Option<&str> {
    let value = value.trim();
    let token = match value.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => value[7..].trim(),
        _ => value,
    };
    (!token.is_empty()).then_some(token)
}

/// Verify the credential and require the admin role
pub async fn require_operator(
    verifier: &dyn IdentityVerifier,
    bearer: Option<&str>,
) -> Result<CallerIdentity> {
    let token = bearer
        .and_then(bearer_from_header)
        .ok_or(AuthError::NotAuthenticated)?;

    let caller = verifier.verify(token).await?;
    if !caller.is_admin() {
        warn!(subject = %caller.subject, role = %caller.role, "Operator route refused");
        return Err(AuthError::Forbidden {
            subject: caller.subject,
            required: Role::Admin.to_string(),
        });
    }

    debug!(subject = %caller.subject, "Operator verified");
    Ok(caller)
}

/// Verifier over a fixed table of tokens, for service accounts and tests.
///
/// Tokens are held as SHA-256 digests so the plain values are not kept in
/// memory after registration.
#[derive(Default)]
pub struct StaticTokenVerifier {
    identities: HashMap<String, CallerIdentity>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: &str, identity: CallerIdentity) -> Self {
        self.identities.insert(Self::digest(token), identity);
        self
    }

    fn digest(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, bearer: &str) -> Result<CallerIdentity> {
        self.identities
            .get(&Self::digest(bearer))
            .cloned()
            .ok_or_else(|| AuthError::InvalidCredential("unknown token".to_string()))
    }
}
