use serde::{Deserialize, Serialize};
use std::fmt;

/// Role attached to a verified caller.
///
/// Only [`Role::Admin`] may run sync, scan and prune.
///
/// # Examples
///
/// ```
/// use core_auth::Role;
///
/// assert_eq!(Role::parse("admin"), Some(Role::Admin));
/// assert_eq!(Role::parse("owner"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "editor" => Some(Role::Editor),
            "member" => Some(Role::Member),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity decoded from a bearer credential.
///
/// The `Debug` implementation masks the email address.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// Stable subject identifier from the identity provider
    pub subject: String,
    pub email: Option<String>,
    pub role: Role,
}

impl CallerIdentity {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            email: None,
            role,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl fmt::Debug for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerIdentity")
            .field("subject", &self.subject)
            .field("email", &self.email.as_ref().map(|_| "[REDACTED]"))
            .field("role", &self.role)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_serde() {
        let json = serde_json::to_string(&Role::Editor).unwrap();
        assert_eq!(json, "\"editor\"");
        assert_eq!(serde_json::from_str::<Role>(&json).unwrap(), Role::Editor);
    }

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!(Role::parse(" ADMIN "), Some(Role::Admin));
        assert_eq!(Role::parse("Member"), Some(Role::Member));
    }

    #[test]
    fn test_debug_masks_email() {
        let caller = CallerIdentity::new("uid-1", Role::Admin).with_email("ops@example.com");
        let debug = format!("{:?}", caller);

        assert!(!debug.contains("ops@example.com"));
        assert!(debug.contains("uid-1"));
        assert!(caller.is_admin());
    }
}
