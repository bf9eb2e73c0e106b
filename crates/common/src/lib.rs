// ================
// common/src/lib.rs
// ================
//! Common types shared between the Shelfmark backend crates.
//! This module defines the persisted account record and the role set
//! recognised by the tracker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique account identifier
pub type AccountId = Uuid;

/// Roles recognised by the tracker
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Regular member: owns shelves and books
    User,
    /// Administrator: may manage other accounts
    Admin,
}

/// Error returned when a role name is not part of the recognised set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRoleError(pub String);

impl fmt::Display for UnknownRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised role: {}", self.0)
    }
}

impl std::error::Error for UnknownRoleError {}

impl FromStr for Role {
    type Err = UnknownRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Role::User),
            "Admin" => Ok(Role::Admin),
            other => Err(UnknownRoleError(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

/// A persisted account record
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Account {
    /// Opaque account identifier
    pub id: AccountId,
    /// Email address, unique and case-sensitive as stored
    pub email: String,
    /// Serialized password hash record; absent until a credential is set
    pub password_hash: Option<String>,
    /// Granted roles; non-empty for an active usable account
    pub roles: Vec<Role>,
    /// Single-use activation token; present while activation is outstanding
    pub activation_token: Option<String>,
    /// Single-use reset token; present while a password reset is outstanding
    pub reset_password_token: Option<String>,
}

impl Account {
    /// Create a freshly registered account awaiting activation.
    pub fn new(
        email: impl Into<String>,
        password_hash: String,
        role: Role,
        activation_token: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: Some(password_hash),
            roles: vec![role],
            activation_token: Some(activation_token),
            reset_password_token: None,
        }
    }

    /// Whether activation is still outstanding.
    /// An empty stored token counts as cleared.
    pub fn is_pending_activation(&self) -> bool {
        matches!(&self.activation_token, Some(t) if !t.is_empty())
    }

    /// Whether a password reset request is outstanding.
    pub fn is_reset_pending(&self) -> bool {
        matches!(&self.reset_password_token, Some(t) if !t.is_empty())
    }

    /// Whether the account holds the given role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Consume the activation token, moving the account into the active state.
    pub fn activated(mut self) -> Self {
        self.activation_token = None;
        self
    }

    /// Replace the stored credential with a freshly derived hash record.
    pub fn with_password_hash(mut self, record: String) -> Self {
        self.password_hash = Some(record);
        self
    }

    /// Mark a password reset as outstanding.
    pub fn with_reset_token(mut self, token: String) -> Self {
        self.reset_password_token = Some(token);
        self
    }

    /// Consume the reset token, concluding the outstanding reset.
    pub fn reset_concluded(mut self) -> Self {
        self.reset_password_token = None;
        self
    }

    /// Grant a role. The caller checks for duplicates.
    pub fn granted(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }

    /// Revoke a role. The caller checks for presence.
    pub fn revoked(mut self, role: Role) -> Self {
        self.roles.retain(|r| *r != role);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Account {
        Account::new("reader@example.com", "1.abc.def".to_string(), Role::User, "tok".to_string())
    }

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("User".parse::<Role>().unwrap(), Role::User);
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Admin.to_string(), "Admin");

        let err = "Librarian".parse::<Role>().unwrap_err();
        assert_eq!(err, UnknownRoleError("Librarian".to_string()));
    }

    #[test]
    fn test_new_account_is_pending() {
        let account = sample();
        assert!(account.is_pending_activation());
        assert!(!account.is_reset_pending());
        assert!(account.has_role(Role::User));
        assert!(!account.has_role(Role::Admin));
    }

    #[test]
    fn test_activation_consumes_token() {
        let account = sample().activated();
        assert!(!account.is_pending_activation());
        assert_eq!(account.activation_token, None);
    }

    #[test]
    fn test_empty_token_counts_as_cleared() {
        let mut account = sample();
        account.activation_token = Some(String::new());
        assert!(!account.is_pending_activation());
    }

    #[test]
    fn test_reset_token_round_trip() {
        let account = sample().with_reset_token("reset-tok".to_string());
        assert!(account.is_reset_pending());
        let account = account.reset_concluded();
        assert!(!account.is_reset_pending());
    }

    #[test]
    fn test_role_grant_and_revoke() {
        let account = sample().granted(Role::Admin);
        assert!(account.has_role(Role::Admin));
        let account = account.revoked(Role::User);
        assert_eq!(account.roles, vec![Role::Admin]);
    }

    #[test]
    fn test_account_serde_round_trip() {
        let account = sample();
        let json = serde_json::to_string(&account).unwrap();
        let back: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(account, back);
    }
}
