// ============================
// crates/auth-lib/src/store.rs
// ============================
//! Account persistence abstraction with an in-memory implementation.
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use shelfmark_common::Account;
use tokio::sync::RwLock;

use crate::error::AuthError;

/// Trait for account persistence backends.
///
/// The lifecycle treats these operations as atomic and durable, and does not
/// retry on failure. There is no optimistic concurrency control across a
/// read-then-save pair: two concurrent consumers of the same single-use
/// token can both observe it as outstanding before either clears it. A
/// backend may tighten `save` into a compare-and-clear to close that gap.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up an account by email. Lookups are case-sensitive.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError>;

    /// Persist a newly created account
    async fn create(&self, account: &Account) -> Result<(), AuthError>;

    /// Persist changes to an existing account
    async fn save(&self, account: &Account) -> Result<(), AuthError>;
}

/// In-memory implementation of the [`AccountStore`] trait, keyed by email.
/// Backs tests and local development.
#[derive(Clone, Default)]
pub struct MemoryAccountStore {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(email).cloned())
    }

    async fn create(&self, account: &Account) -> Result<(), AuthError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.email) {
            return Err(AuthError::EmailTaken);
        }
        accounts.insert(account.email.clone(), account.clone());
        Ok(())
    }

    async fn save(&self, account: &Account) -> Result<(), AuthError> {
        let mut accounts = self.accounts.write().await;
        match accounts.get_mut(&account.email) {
            Some(slot) => {
                *slot = account.clone();
                Ok(())
            }
            None => Err(AuthError::Store(anyhow!(
                "no account stored for {}",
                account.email
            ))),
        }
    }
}
