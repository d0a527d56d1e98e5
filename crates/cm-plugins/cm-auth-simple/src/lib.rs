//! # cm-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! Handles password hashing and opaque session tokens.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use async_trait::async_trait;
use base64::Engine;
use cm_core::traits::AuthProvider;
use sha2::{Digest, Sha256};

/// Random bytes per session token.
const TOKEN_BYTES: usize = 32;

pub struct SimpleAuthProvider {
    /// Secret mixed into every stored token digest, so a leaked sessions table
    /// cannot be replayed without it.
    session_salt: String,
    argon2: Argon2<'static>,
}

impl SimpleAuthProvider {
    /// Accepts a salt string (e.g., from the configuration).
    pub fn new(salt: &str) -> Self {
        Self {
            session_salt: salt.to_string(),
            argon2: Argon2::default(),
        }
    }

    /// Uses custom Argon2 cost parameters (tests use the minimum).
    pub fn with_params(salt: &str, params: Params) -> Self {
        Self {
            session_salt: salt.to_string(),
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        }
    }

    fn random_bytes<const N: usize>() -> anyhow::Result<[u8; N]> {
        let mut buf = [0u8; N];
        getrandom::getrandom(&mut buf).map_err(|e| anyhow::anyhow!("os rng unavailable: {e}"))?;
        Ok(buf)
    }
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    /// Hashes with a fresh 16-byte salt into a PHC string (`$argon2id$v=19$...`).
    fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let salt_bytes = Self::random_bytes::<16>()?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow::anyhow!("salt encoding: {e}"))?;
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
        Ok(hash.to_string())
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// URL-safe base64 of 32 random bytes.
    fn generate_session_token(&self) -> anyhow::Result<String> {
        let bytes = Self::random_bytes::<TOKEN_BYTES>()?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Hex SHA-256 of salt || token.
    fn digest_session_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.session_salt.as_bytes());
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}
