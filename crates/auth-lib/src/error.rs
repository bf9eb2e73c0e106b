// ============================
// crates/auth-lib/src/error.rs
// ============================
//! Central error types for the credential core.
use thiserror::Error;

use crate::password::HashRecordError;

/// Configuration errors. Fatal at startup: the service must not accept
/// traffic with an invalid security configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("token signing key is missing or empty")]
    MissingSigningKey,

    #[error("PBKDF2 iteration count must be a positive integer")]
    InvalidIterations,

    #[error("access token lifetime must be a positive number of minutes")]
    InvalidTokenLifetime,

    #[error("invalid {name} pattern: {source}")]
    InvalidPattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("default role is not part of the recognised role set: {0}")]
    UnknownDefaultRole(String),
}

/// Account lifecycle failures with reason codes and sanitized messages
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid email address")]
    InvalidEmail,

    #[error("invalid password")]
    InvalidPassword,

    #[error("password confirmation does not match")]
    PasswordMismatch,

    #[error("email address is already registered")]
    EmailTaken,

    #[error("account not found")]
    AccountNotFound,

    #[error("token does not match an outstanding request")]
    TokenMismatch,

    #[error("wrong credentials")]
    WrongCredentials,

    #[error("password hash was derived under a stale cost parameter")]
    CredentialExpired,

    #[error("account has not been activated")]
    PendingActivation,

    #[error("no credential set for account")]
    NoCredential,

    #[error("account record failed integrity checks")]
    IntegrityFailure,

    #[error("unrecognised role: {0}")]
    UnknownRole(String),

    #[error("role is already granted")]
    RoleAlreadyGranted,

    #[error("role is not granted")]
    RoleNotGranted,

    #[error("corrupt password hash record: {0}")]
    CorruptHashRecord(#[from] HashRecordError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("account store error: {0}")]
    Store(anyhow::Error),

    #[error("email dispatch error: {0}")]
    Dispatch(anyhow::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the machine-readable reason code for this error
    pub fn reason_code(&self) -> &'static str {
        match self {
            AuthError::InvalidEmail => "VAL_001",
            AuthError::InvalidPassword => "VAL_002",
            AuthError::PasswordMismatch => "VAL_003",
            AuthError::EmailTaken => "VAL_004",
            AuthError::AccountNotFound => "NF_001",
            AuthError::TokenMismatch => "NF_002",
            AuthError::WrongCredentials => "AUTH_001",
            AuthError::CredentialExpired => "AUTH_002",
            AuthError::PendingActivation => "AUTH_003",
            AuthError::NoCredential => "AUTH_004",
            AuthError::IntegrityFailure => "AUTH_005",
            AuthError::UnknownRole(_) => "ROLE_001",
            AuthError::RoleAlreadyGranted => "ROLE_002",
            AuthError::RoleNotGranted => "ROLE_003",
            AuthError::CorruptHashRecord(_) => "FMT_001",
            AuthError::Config(_) => "CFG_001",
            AuthError::Store(_) => "STORE_001",
            AuthError::Dispatch(_) => "MAIL_001",
            AuthError::Internal(_) => "INT_001",
        }
    }

    /// Whether this error is unrecoverable for the current request.
    /// Fatal errors propagate to the boundary as internal failures instead of
    /// typed rejections.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AuthError::CorruptHashRecord(_)
                | AuthError::Config(_)
                | AuthError::Store(_)
                | AuthError::Dispatch(_)
                | AuthError::Internal(_)
        )
    }

    /// Get a sanitized message suitable for the API boundary.
    /// Validation and not-found rejections share identical wording so the
    /// responses cannot be used to probe which accounts exist.
    pub fn sanitized_message(&self) -> String {
        match self {
            AuthError::InvalidEmail
            | AuthError::InvalidPassword
            | AuthError::PasswordMismatch
            | AuthError::EmailTaken
            | AuthError::AccountNotFound
            | AuthError::TokenMismatch => "Invalid request details".to_string(),
            AuthError::WrongCredentials
            | AuthError::CredentialExpired
            | AuthError::PendingActivation
            | AuthError::NoCredential
            | AuthError::IntegrityFailure => "Authentication failed".to_string(),
            AuthError::UnknownRole(_)
            | AuthError::RoleAlreadyGranted
            | AuthError::RoleNotGranted => "Invalid role request".to_string(),
            AuthError::CorruptHashRecord(_)
            | AuthError::Config(_)
            | AuthError::Store(_)
            | AuthError::Dispatch(_)
            | AuthError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}
