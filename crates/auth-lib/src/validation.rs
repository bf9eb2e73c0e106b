// ============================
// crates/auth-lib/src/validation.rs
// ============================
//! Email and password format checks.

use regex::Regex;

use crate::config::ValidationSettings;
use crate::error::ConfigError;

/// Compiled format checks for account input.
///
/// Patterns come from configuration and are compiled once at startup. Both
/// checks are pure; callers offload them to a blocking context alongside the
/// key derivation work.
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    email_pattern: Regex,
    email_max_length: usize,
    password_pattern: Regex,
    password_max_length: usize,
}

impl ValidationPolicy {
    /// Compile the configured patterns. Patterns are anchored so a partial
    /// match never passes as a full match.
    pub fn from_settings(settings: &ValidationSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            email_pattern: compile_anchored(&settings.email_pattern, "email")?,
            email_max_length: settings.email_max_length,
            password_pattern: compile_anchored(&settings.password_pattern, "password")?,
            password_max_length: settings.password_max_length,
        })
    }

    /// True iff the email is within the configured length limit and fully
    /// matches the configured pattern.
    pub fn is_email_valid(&self, email: &str) -> bool {
        email.len() <= self.email_max_length && self.email_pattern.is_match(email)
    }

    /// True iff the password is within the configured length limit and fully
    /// matches the configured pattern.
    pub fn is_password_valid(&self, password: &str) -> bool {
        password.len() <= self.password_max_length && self.password_pattern.is_match(password)
    }
}

fn compile_anchored(pattern: &str, name: &'static str) -> Result<Regex, ConfigError> {
    Regex::new(&format!(r"\A(?:{pattern})\z"))
        .map_err(|source| ConfigError::InvalidPattern { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationSettings;

    fn policy() -> ValidationPolicy {
        ValidationPolicy::from_settings(&ValidationSettings::default()).unwrap()
    }

    #[test]
    fn test_validate_email() {
        let policy = policy();

        assert!(policy.is_email_valid("test@example.com"));
        assert!(policy.is_email_valid("user.name+tag@example.co.uk"));

        // No @
        assert!(!policy.is_email_valid("test.example.com"));
        // No domain
        assert!(!policy.is_email_valid("test@"));
        // No TLD
        assert!(!policy.is_email_valid("test@example"));
        // Empty
        assert!(!policy.is_email_valid(""));
    }

    #[test]
    fn test_email_length_limit() {
        let policy = policy();
        let local = "a".repeat(250);
        let too_long = format!("{local}@example.com");
        assert!(too_long.len() > 254);
        assert!(!policy.is_email_valid(&too_long));
    }

    #[test]
    fn test_validate_password() {
        let policy = policy();

        assert!(policy.is_password_valid("Secr3t!pass"));
        assert!(policy.is_password_valid("correct-horse-battery"));

        // Too short
        assert!(!policy.is_password_valid("Short1!"));
        // Spaces are outside the printable-ASCII pattern
        assert!(!policy.is_password_valid("has a space1"));
        // Too long
        assert!(!policy.is_password_valid(&"a".repeat(129)));
    }

    #[test]
    fn test_patterns_are_anchored() {
        // A valid email embedded in junk must not pass.
        let policy = policy();
        assert!(!policy.is_email_valid("junk test@example.com junk"));
        assert!(!policy.is_email_valid("test@example.com\nmore"));
    }

    #[test]
    fn test_custom_pattern() {
        let settings = ValidationSettings {
            password_pattern: r"[0-9]{4}".to_string(),
            password_max_length: 4,
            ..ValidationSettings::default()
        };
        let policy = ValidationPolicy::from_settings(&settings).unwrap();

        assert!(policy.is_password_valid("1234"));
        assert!(!policy.is_password_valid("123"));
        assert!(!policy.is_password_valid("abcd"));
    }
}
