// ============================
// crates/auth-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use shelfmark_common::Role;

use crate::error::ConfigError;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL embedded in activation and reset links
    pub public_base_url: String,
    /// Log level
    pub log_level: String,
    /// Credential and token parameters
    pub security: SecuritySettings,
    /// Input format limits and patterns
    pub validation: ValidationSettings,
}

/// Credential and token parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecuritySettings {
    /// Symmetric key used to sign access tokens
    pub token_signing_key: String,
    /// PBKDF2 iteration count for newly derived password hashes
    pub pbkdf2_iterations: u32,
    /// Access token lifetime in minutes
    pub token_ttl_minutes: i64,
    /// Role granted to newly registered accounts
    pub default_role: String,
}

/// Input format limits and patterns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Email address pattern, matched against the full input
    pub email_pattern: String,
    /// Maximum email length in bytes
    pub email_max_length: usize,
    /// Password pattern, matched against the full input
    pub password_pattern: String,
    /// Maximum password length in bytes
    pub password_max_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:3000".to_string(),
            log_level: "info".to_string(),
            security: SecuritySettings::default(),
            validation: ValidationSettings::default(),
        }
    }
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            token_signing_key: String::new(),
            pbkdf2_iterations: 210_000,
            token_ttl_minutes: 60,
            default_role: "User".to_string(),
        }
    }
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            email_pattern: r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}".to_string(),
            email_max_length: 254, // RFC 5321 SMTP limit
            password_pattern: r"[!-~]{8,}".to_string(),
            password_max_length: 128,
        }
    }
}

impl Settings {
    /// Load settings from config files and the environment.
    pub fn load() -> Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("shelfmark.toml"))
            .merge(Yaml::file("shelfmark.yaml"))
            .merge(Json::file("shelfmark.json"))
            .merge(Env::prefixed("SHELFMARK_").split("__"))
            .extract()?;

        Ok(settings)
    }

    /// Validate the security surface. Called once at startup; a failure here
    /// must prevent the service from accepting traffic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.token_signing_key.is_empty() {
            return Err(ConfigError::MissingSigningKey);
        }

        if self.security.pbkdf2_iterations == 0 {
            return Err(ConfigError::InvalidIterations);
        }

        if self.security.token_ttl_minutes <= 0 {
            return Err(ConfigError::InvalidTokenLifetime);
        }

        self.security
            .default_role
            .parse::<Role>()
            .map_err(|e| ConfigError::UnknownDefaultRole(e.0))?;

        regex::Regex::new(&self.validation.email_pattern).map_err(|source| {
            ConfigError::InvalidPattern {
                name: "email",
                source,
            }
        })?;

        regex::Regex::new(&self.validation.password_pattern).map_err(|source| {
            ConfigError::InvalidPattern {
                name: "password",
                source,
            }
        })?;

        Ok(())
    }
}
