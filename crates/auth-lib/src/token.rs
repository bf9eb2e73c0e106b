// ============================
// crates/auth-lib/src/token.rs
// ============================
//! Access token signing and opaque token generation.
use anyhow::Context;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use shelfmark_common::Role;

use crate::error::ConfigError;

/// Opaque token size in bytes (64 bytes = 512 bits of entropy)
const OPAQUE_TOKEN_BYTES: usize = 64;

/// Claims carried by a signed access token
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the account email
    pub sub: String,
    /// Granted roles, one entry per role
    pub roles: Vec<String>,
    /// Issued-at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

/// Signs and verifies access tokens with the configured symmetric key.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// An empty signing key is a startup configuration error; token issuance
    /// itself never fails on the key.
    pub fn new(signing_key: &str, ttl_minutes: i64) -> Result<Self, ConfigError> {
        if signing_key.is_empty() {
            return Err(ConfigError::MissingSigningKey);
        }
        if ttl_minutes <= 0 {
            return Err(ConfigError::InvalidTokenLifetime);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(signing_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(signing_key.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        })
    }

    /// Issue a signed access token for an authenticated account.
    pub fn access_token(&self, email: &str, roles: &[Role]) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: email.to_string(),
            roles: roles.iter().map(Role::to_string).collect(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .context("failed to sign access token")
    }

    /// Decode and verify a token produced by [`TokenIssuer::access_token`].
    /// Signature and expiry are both checked.
    pub fn decode_access_token(&self, token: &str) -> anyhow::Result<AccessClaims> {
        let data = decode::<AccessClaims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .context("access token rejected")?;
        Ok(data.claims)
    }
}

/// Generate a single-use random token for activation and reset links.
/// Consumption state lives on the account record; the token itself carries
/// no expiry.
pub fn generate_opaque_token() -> String {
    let mut buffer = [0u8; OPAQUE_TOKEN_BYTES];
    OsRng.fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}
