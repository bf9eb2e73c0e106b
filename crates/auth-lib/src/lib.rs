// ============================
// crates/auth-lib/src/lib.rs
// ============================
//! Credential and session security core for the Shelfmark library tracker.
//!
//! The HTTP layer, entity persistence and email delivery are external
//! collaborators: they plug in through [`store::AccountStore`] and
//! [`email::EmailDispatcher`] and drive the flows on
//! [`lifecycle::AccountLifecycle`].

pub mod config;
pub mod email;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod password;
pub mod store;
pub mod token;
pub mod validation;

use std::sync::Arc;

use crate::config::Settings;
use crate::email::EmailDispatcher;
use crate::error::ConfigError;
use crate::lifecycle::AccountLifecycle;
use crate::store::AccountStore;

pub use crate::error::AuthError;
pub use crate::password::{PasswordCipher, Verification};
pub use crate::token::{generate_opaque_token, AccessClaims, TokenIssuer};
pub use crate::validation::ValidationPolicy;

/// Application state shared with the external request-handling layer
#[derive(Clone)]
pub struct AppState {
    /// Account lifecycle orchestrator
    pub lifecycle: Arc<AccountLifecycle>,
    /// Validated settings
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state. Settings are validated here so an
    /// invalid security configuration fails at startup rather than on the
    /// first request.
    pub fn new(
        store: Arc<dyn AccountStore>,
        mailer: Arc<dyn EmailDispatcher>,
        settings: Settings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let lifecycle = Arc::new(AccountLifecycle::new(store, mailer, &settings)?);

        Ok(Self {
            lifecycle,
            settings: Arc::new(settings),
        })
    }
}
