//! Shared-secret authentication for the save endpoint.
//!
//! A password is accepted when it equals the configured raw secret, or when
//! its SHA-256 hex digest equals the configured hash. Both comparisons run in
//! constant time.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::Config;

/// The configured save credential.
#[derive(Clone, Default)]
pub struct Credential {
    secret: Option<String>,
    hash: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("hash", &self.hash.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credential {
    /// Build a credential from a raw secret and/or its SHA-256 hex digest.
    pub fn new(secret: Option<String>, hash: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
            hash: hash
                .filter(|h| !h.is_empty())
                .map(|h| h.to_ascii_lowercase()),
        }
    }

    /// Build a credential from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.save_password.clone(),
            config.save_password_hash.clone(),
        )
    }

    /// Check a submitted password.
    pub fn verify(&self, password: &str) -> bool {
        let raw_ok = self
            .secret
            .as_deref()
            .is_some_and(|secret| constant_time_eq(secret, password));

        let hash_ok = self
            .hash
            .as_deref()
            .is_some_and(|hash| constant_time_eq(hash, &sha256_hex(password)));

        raw_ok || hash_ok
    }
}

/// Lowercase hex SHA-256 digest of `input`.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
