// ============================
// crates/auth-lib/src/email.rs
// ============================
//! Email dispatch abstraction for account notification mail.
use std::collections::HashMap;

use async_trait::async_trait;
use tracing::info;

use crate::error::AuthError;

/// Template fields rendered into an outgoing message
pub type TemplateFields = HashMap<String, String>;

/// Trait for outbound account mail. Delivery and template rendering live
/// outside this crate; the lifecycle only hands over the template key and
/// its fields.
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    /// Queue a templated message for delivery
    async fn send(
        &self,
        subject: &str,
        template_key: &str,
        recipient: &str,
        fields: TemplateFields,
    ) -> Result<(), AuthError>;
}

/// Dispatcher that logs messages instead of delivering them.
/// Stands in for a real mailer in development and tests.
#[derive(Clone, Default)]
pub struct LogDispatcher;

#[async_trait]
impl EmailDispatcher for LogDispatcher {
    async fn send(
        &self,
        subject: &str,
        template_key: &str,
        recipient: &str,
        fields: TemplateFields,
    ) -> Result<(), AuthError> {
        info!(subject, template_key, recipient, ?fields, "account mail dispatched");
        Ok(())
    }
}
