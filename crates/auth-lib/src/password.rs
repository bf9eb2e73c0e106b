// ============================
// crates/auth-lib/src/password.rs
// ============================
//! Password hashing and verification.
use base64::{engine::general_purpose::STANDARD, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha512;
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroize;

/// Salt length in bytes
pub const SALT_LENGTH: usize = 16;

/// Derived key length in bytes
pub const KEY_LENGTH: usize = 32;

/// Outcome of checking a password against a stored hash record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    /// The supplied password reproduces the stored key
    pub verified: bool,
    /// The record was derived under an iteration count other than the one
    /// currently configured
    pub needs_upgrade: bool,
}

/// Corrupt hash record. Indicates stored-data corruption and is never
/// silently recovered; the caller logs it and fails the request.
#[derive(Error, Debug)]
pub enum HashRecordError {
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),

    #[error("iteration count is not a positive integer")]
    BadIterations,

    #[error("salt segment is not valid base64")]
    BadSaltEncoding,

    #[error("key segment is not valid base64")]
    BadKeyEncoding,

    #[error("expected a 16-byte salt, found {0} bytes")]
    SaltLength(usize),

    #[error("expected a 32-byte derived key, found {0} bytes")]
    KeyLength(usize),
}

/// Derives and verifies password hash records.
///
/// A record serializes as `{iterations}.{salt_b64}.{key_b64}` with a random
/// 16-byte salt and a 32-byte key derived via PBKDF2-HMAC-SHA512. Records are
/// always checked under their own stored iteration count, so hashes produced
/// under an older cost parameter still verify and are reported through
/// [`Verification::needs_upgrade`].
#[derive(Debug, Clone, Copy)]
pub struct PasswordCipher {
    iterations: u32,
}

impl PasswordCipher {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    /// Derive a fresh hash record for `password` under the configured cost.
    /// The caller is responsible for persisting the returned record.
    pub fn encrypt(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut salt);

        let mut key = [0u8; KEY_LENGTH];
        pbkdf2_hmac::<Sha512>(password.as_bytes(), &salt, self.iterations, &mut key);

        let record = format!(
            "{}.{}.{}",
            self.iterations,
            STANDARD.encode(salt),
            STANDARD.encode(key)
        );
        key.zeroize();
        record
    }

    /// Check `password` against a stored record.
    ///
    /// The candidate key is re-derived under the record's own salt and
    /// iteration count, not the currently configured count, and compared in
    /// constant time. A record that does not parse is data corruption and
    /// fails hard.
    pub fn check(&self, record: &str, password: &str) -> Result<Verification, HashRecordError> {
        let parts: Vec<&str> = record.split('.').collect();
        if parts.len() != 3 {
            return Err(HashRecordError::SegmentCount(parts.len()));
        }

        let iterations: u32 = parts[0]
            .parse()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(HashRecordError::BadIterations)?;

        let salt = STANDARD
            .decode(parts[1])
            .map_err(|_| HashRecordError::BadSaltEncoding)?;
        if salt.len() != SALT_LENGTH {
            return Err(HashRecordError::SaltLength(salt.len()));
        }

        let stored_key = STANDARD
            .decode(parts[2])
            .map_err(|_| HashRecordError::BadKeyEncoding)?;
        if stored_key.len() != KEY_LENGTH {
            return Err(HashRecordError::KeyLength(stored_key.len()));
        }

        let mut candidate = [0u8; KEY_LENGTH];
        pbkdf2_hmac::<Sha512>(password.as_bytes(), &salt, iterations, &mut candidate);

        let verified: bool = candidate.ct_eq(&stored_key[..]).into();
        candidate.zeroize();

        Ok(Verification {
            verified,
            needs_upgrade: iterations != self.iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost keeps the test suite fast; the derivation path is identical.
    const TEST_ITERATIONS: u32 = 1_000;

    fn cipher() -> PasswordCipher {
        PasswordCipher::new(TEST_ITERATIONS)
    }

    #[test]
    fn test_encrypt_then_check_verifies() {
        let cipher = cipher();
        let record = cipher.encrypt("Secr3t!pass");

        let outcome = cipher.check(&record, "Secr3t!pass").unwrap();
        assert_eq!(
            outcome,
            Verification {
                verified: true,
                needs_upgrade: false,
            }
        );
    }

    #[test]
    fn test_wrong_password_fails_verification() {
        let cipher = cipher();
        let record = cipher.encrypt("Secr3t!pass");

        let outcome = cipher.check(&record, "wrong-password").unwrap();
        assert!(!outcome.verified);
        assert!(!outcome.needs_upgrade);
    }

    #[test]
    fn test_record_has_three_segments_with_configured_cost() {
        let record = cipher().encrypt("Secr3t!pass");
        let parts: Vec<&str> = record.split('.').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].parse::<u32>().unwrap(), TEST_ITERATIONS);
        assert_eq!(STANDARD.decode(parts[1]).unwrap().len(), SALT_LENGTH);
        assert_eq!(STANDARD.decode(parts[2]).unwrap().len(), KEY_LENGTH);
    }

    #[test]
    fn test_salts_are_fresh_per_record() {
        let cipher = cipher();
        let a = cipher.encrypt("Secr3t!pass");
        let b = cipher.encrypt("Secr3t!pass");
        assert_ne!(a, b);
    }

    #[test]
    fn test_stale_cost_still_verifies_and_flags_upgrade() {
        let old = PasswordCipher::new(TEST_ITERATIONS);
        let record = old.encrypt("Secr3t!pass");

        // Same record checked under a raised configured cost.
        let current = PasswordCipher::new(TEST_ITERATIONS * 2);
        let outcome = current.check(&record, "Secr3t!pass").unwrap();
        assert_eq!(
            outcome,
            Verification {
                verified: true,
                needs_upgrade: true,
            }
        );

        // The wrong password under a stale record is still just unverified.
        let outcome = current.check(&record, "wrong-password").unwrap();
        assert!(!outcome.verified);
        assert!(outcome.needs_upgrade);
    }

    #[test]
    fn test_wrong_segment_count_is_fatal() {
        let cipher = cipher();

        assert!(matches!(
            cipher.check("only-one-segment", "pw"),
            Err(HashRecordError::SegmentCount(1))
        ));
        assert!(matches!(
            cipher.check("1.two", "pw"),
            Err(HashRecordError::SegmentCount(2))
        ));
        assert!(matches!(
            cipher.check("1.a.b.c", "pw"),
            Err(HashRecordError::SegmentCount(4))
        ));
    }

    #[test]
    fn test_bad_iteration_segment_is_fatal() {
        let cipher = cipher();
        let record = cipher.encrypt("Secr3t!pass");
        let tail = record.split_once('.').unwrap().1;

        for bad in ["0", "-5", "many", ""] {
            let corrupt = format!("{bad}.{tail}");
            assert!(matches!(
                cipher.check(&corrupt, "Secr3t!pass"),
                Err(HashRecordError::BadIterations)
            ));
        }
    }

    #[test]
    fn test_bad_base64_segments_are_fatal() {
        let cipher = cipher();

        let bad_salt = format!("{TEST_ITERATIONS}.!!!.{}", STANDARD.encode([0u8; KEY_LENGTH]));
        assert!(matches!(
            cipher.check(&bad_salt, "pw"),
            Err(HashRecordError::BadSaltEncoding)
        ));

        let bad_key = format!("{TEST_ITERATIONS}.{}.!!!", STANDARD.encode([0u8; SALT_LENGTH]));
        assert!(matches!(
            cipher.check(&bad_key, "pw"),
            Err(HashRecordError::BadKeyEncoding)
        ));
    }

    #[test]
    fn test_wrong_lengths_are_fatal() {
        let cipher = cipher();

        let short_salt = format!(
            "{TEST_ITERATIONS}.{}.{}",
            STANDARD.encode([0u8; 8]),
            STANDARD.encode([0u8; KEY_LENGTH])
        );
        assert!(matches!(
            cipher.check(&short_salt, "pw"),
            Err(HashRecordError::SaltLength(8))
        ));

        let short_key = format!(
            "{TEST_ITERATIONS}.{}.{}",
            STANDARD.encode([0u8; SALT_LENGTH]),
            STANDARD.encode([0u8; 31])
        );
        assert!(matches!(
            cipher.check(&short_key, "pw"),
            Err(HashRecordError::KeyLength(31))
        ));
    }
}
