// ============================
// crates/auth-lib/src/lifecycle.rs
// ============================
//! Account lifecycle state machine: registration, activation, login,
//! password reset and role management.
//!
//! Every operation runs as a request-scoped unit of work: fetch the account,
//! transform an owned copy, persist it explicitly. No shared mutable entity
//! crosses calls. CPU-bound work (key derivation, pattern matching) is
//! dispatched to the blocking pool so request tasks are never stalled.
use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use shelfmark_common::{Account, Role};
use tokio::task;
use tracing::{error, info};

use crate::config::Settings;
use crate::email::{EmailDispatcher, TemplateFields};
use crate::error::{AuthError, ConfigError};
use crate::metrics as keys;
use crate::password::{PasswordCipher, Verification};
use crate::store::AccountStore;
use crate::token::{self, TokenIssuer};
use crate::validation::ValidationPolicy;

const ACTIVATION_SUBJECT: &str = "Activate your Shelfmark account";
const ACTIVATION_TEMPLATE: &str = "account_activation";
const RESET_SUBJECT: &str = "Reset your Shelfmark password";
const RESET_TEMPLATE: &str = "password_reset";

/// Orchestrates the credential components against the account store and the
/// email dispatcher.
pub struct AccountLifecycle {
    store: Arc<dyn AccountStore>,
    mailer: Arc<dyn EmailDispatcher>,
    policy: ValidationPolicy,
    cipher: PasswordCipher,
    issuer: TokenIssuer,
    default_role: Role,
    public_base_url: String,
}

impl AccountLifecycle {
    /// Wire up the lifecycle from validated settings. Configuration errors
    /// here are fatal at startup.
    pub fn new(
        store: Arc<dyn AccountStore>,
        mailer: Arc<dyn EmailDispatcher>,
        settings: &Settings,
    ) -> Result<Self, ConfigError> {
        if settings.security.pbkdf2_iterations == 0 {
            return Err(ConfigError::InvalidIterations);
        }

        let policy = ValidationPolicy::from_settings(&settings.validation)?;
        let issuer = TokenIssuer::new(
            &settings.security.token_signing_key,
            settings.security.token_ttl_minutes,
        )?;
        let default_role = settings
            .security
            .default_role
            .parse::<Role>()
            .map_err(|e| ConfigError::UnknownDefaultRole(e.0))?;

        Ok(Self {
            store,
            mailer,
            policy,
            cipher: PasswordCipher::new(settings.security.pbkdf2_iterations),
            issuer,
            default_role,
            public_base_url: settings.public_base_url.clone(),
        })
    }

    /// Register a new account. The account starts in the pending-activation
    /// state and an activation link is mailed to the given address.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        password_repeat: &str,
    ) -> Result<Account, AuthError> {
        if !self.email_format_ok(email).await? {
            return Err(AuthError::InvalidEmail);
        }
        if self.store.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }
        if !self.password_format_ok(password).await? {
            return Err(AuthError::InvalidPassword);
        }
        if password != password_repeat {
            return Err(AuthError::PasswordMismatch);
        }

        let record = self.encrypt_password(password).await?;
        let activation_token = token::generate_opaque_token();
        let account = Account::new(email, record, self.default_role, activation_token.clone());
        self.store.create(&account).await?;

        counter!(keys::ACCOUNT_REGISTERED).increment(1);
        info!(email = %account.email, "account registered, activation pending");

        let fields: TemplateFields = HashMap::from([(
            "activation_url".to_string(),
            self.activation_url(&activation_token),
        )]);
        self.mailer
            .send(ACTIVATION_SUBJECT, ACTIVATION_TEMPLATE, email, fields)
            .await?;

        Ok(account)
    }

    /// Consume an activation token, moving the account into the active state.
    /// The token is cleared on success, so a replay fails the match.
    pub async fn activate(&self, email: &str, token: &str) -> Result<Account, AuthError> {
        let account = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        match &account.activation_token {
            Some(stored) if !stored.is_empty() && stored == token => {}
            _ => return Err(AuthError::TokenMismatch),
        }

        let account = account.activated();
        self.store.save(&account).await?;

        counter!(keys::ACCOUNT_ACTIVATED).increment(1);
        info!(email = %account.email, "account activated");

        Ok(account)
    }

    /// Authenticate and issue a signed access token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let result = self.login_flow(email, password).await;
        match &result {
            Ok(_) => counter!(keys::LOGIN_SUCCEEDED).increment(1),
            Err(_) => counter!(keys::LOGIN_REJECTED).increment(1),
        }
        result
    }

    async fn login_flow(&self, email: &str, password: &str) -> Result<String, AuthError> {
        if !self.email_format_ok(email).await? {
            return Err(AuthError::InvalidEmail);
        }
        if !self.password_format_ok(password).await? {
            return Err(AuthError::InvalidPassword);
        }

        let account = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;
        let record = account
            .password_hash
            .clone()
            .ok_or(AuthError::NoCredential)?;

        let outcome = self.check_password(&account.email, record, password).await?;
        if !outcome.verified {
            return Err(AuthError::WrongCredentials);
        }
        // Policy: a hash derived under a stale cost parameter is an expired
        // credential, not a candidate for silent re-hashing. The holder must
        // go through an explicit password reset.
        if outcome.needs_upgrade {
            return Err(AuthError::CredentialExpired);
        }
        if account.is_pending_activation() {
            return Err(AuthError::PendingActivation);
        }
        if account.roles.is_empty() || account.email.is_empty() {
            return Err(AuthError::IntegrityFailure);
        }

        let access_token = self
            .issuer
            .access_token(&account.email, &account.roles)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))?;

        info!(email = %account.email, "login succeeded");
        Ok(access_token)
    }

    /// Open a password reset: store a fresh single-use token and mail a
    /// reset link carrying it.
    pub async fn send_reset_password(&self, email: &str) -> Result<(), AuthError> {
        let account = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let reset_token = token::generate_opaque_token();
        let account = account.with_reset_token(reset_token.clone());
        self.store.save(&account).await?;

        counter!(keys::RESET_REQUESTED).increment(1);
        info!(email = %account.email, "password reset requested");

        let fields: TemplateFields = HashMap::from([(
            "resetpassword_url".to_string(),
            self.reset_url(&reset_token),
        )]);
        self.mailer
            .send(RESET_SUBJECT, RESET_TEMPLATE, email, fields)
            .await?;

        Ok(())
    }

    /// Conclude an outstanding password reset. The token is consumed exactly
    /// once: it is cleared together with the credential swap.
    pub async fn reset_password(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
        new_password_repeat: &str,
    ) -> Result<(), AuthError> {
        let account = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        match &account.reset_password_token {
            Some(stored) if !stored.is_empty() && stored == token => {}
            _ => return Err(AuthError::TokenMismatch),
        }

        if !self.password_format_ok(new_password).await? {
            return Err(AuthError::InvalidPassword);
        }
        if new_password != new_password_repeat {
            return Err(AuthError::PasswordMismatch);
        }

        let record = self.encrypt_password(new_password).await?;
        let account = account.with_password_hash(record).reset_concluded();
        self.store.save(&account).await?;

        counter!(keys::RESET_COMPLETED).increment(1);
        info!(email = %account.email, "password reset completed");

        Ok(())
    }

    /// Change the password of an authenticated account.
    pub async fn change_password(
        &self,
        account: &Account,
        current_password: &str,
        new_password: &str,
        new_password_repeat: &str,
    ) -> Result<Account, AuthError> {
        let record = account
            .password_hash
            .clone()
            .ok_or(AuthError::NoCredential)?;

        let outcome = self
            .check_password(&account.email, record, current_password)
            .await?;
        if !outcome.verified {
            return Err(AuthError::WrongCredentials);
        }
        // A stale cost parameter is acceptable here: the credential is about
        // to be re-derived under the current cost anyway.

        if !self.password_format_ok(new_password).await? {
            return Err(AuthError::InvalidPassword);
        }
        if new_password != new_password_repeat {
            return Err(AuthError::PasswordMismatch);
        }

        let record = self.encrypt_password(new_password).await?;
        let updated = account.clone().with_password_hash(record);
        self.store.save(&updated).await?;

        counter!(keys::PASSWORD_CHANGED).increment(1);
        info!(email = %updated.email, "password changed");

        Ok(updated)
    }

    /// Grant a role by name. The name must parse into the recognised role
    /// set and must not already be held.
    pub async fn add_role(&self, account: &Account, role: &str) -> Result<Account, AuthError> {
        let role = role
            .parse::<Role>()
            .map_err(|e| AuthError::UnknownRole(e.0))?;
        if account.has_role(role) {
            return Err(AuthError::RoleAlreadyGranted);
        }

        let updated = account.clone().granted(role);
        self.store.save(&updated).await?;
        info!(email = %updated.email, %role, "role granted");
        Ok(updated)
    }

    /// Revoke a role by name. The name must parse into the recognised role
    /// set and must currently be held.
    pub async fn remove_role(&self, account: &Account, role: &str) -> Result<Account, AuthError> {
        let role = role
            .parse::<Role>()
            .map_err(|e| AuthError::UnknownRole(e.0))?;
        if !account.has_role(role) {
            return Err(AuthError::RoleNotGranted);
        }

        let updated = account.clone().revoked(role);
        self.store.save(&updated).await?;
        info!(email = %updated.email, %role, "role revoked");
        Ok(updated)
    }

    fn activation_url(&self, token: &str) -> String {
        format!(
            "{}/users/activate?token={}",
            self.public_base_url,
            urlencoding::encode(token)
        )
    }

    fn reset_url(&self, token: &str) -> String {
        format!(
            "{}/users/resetpassword?token={}",
            self.public_base_url,
            urlencoding::encode(token)
        )
    }

    async fn email_format_ok(&self, email: &str) -> Result<bool, AuthError> {
        let policy = self.policy.clone();
        let email = email.to_owned();
        task::spawn_blocking(move || policy.is_email_valid(&email))
            .await
            .map_err(|e| AuthError::Internal(format!("validation task failed: {e}")))
    }

    async fn password_format_ok(&self, password: &str) -> Result<bool, AuthError> {
        let policy = self.policy.clone();
        let password = password.to_owned();
        task::spawn_blocking(move || policy.is_password_valid(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("validation task failed: {e}")))
    }

    async fn encrypt_password(&self, password: &str) -> Result<String, AuthError> {
        let cipher = self.cipher;
        let password = password.to_owned();
        task::spawn_blocking(move || cipher.encrypt(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("key derivation task failed: {e}")))
    }

    async fn check_password(
        &self,
        email: &str,
        record: String,
        password: &str,
    ) -> Result<Verification, AuthError> {
        let cipher = self.cipher;
        let password = password.to_owned();
        let outcome = task::spawn_blocking(move || cipher.check(&record, &password))
            .await
            .map_err(|e| AuthError::Internal(format!("key derivation task failed: {e}")))?;

        match outcome {
            Ok(verification) => Ok(verification),
            Err(err) => {
                // Data corruption: never silently defaulted, always logged
                // with enough context to find the damaged record.
                error!(account = %email, %err, "stored password hash record is corrupt");
                Err(AuthError::CorruptHashRecord(err))
            }
        }
    }
}
