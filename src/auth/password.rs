//! Password hashing

use crate::auth::error::{AuthError, Result};

/// bcrypt work factor used unless configured otherwise
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// Work factors bcrypt accepts
pub const COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// Salted bcrypt hashing with a fixed work factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password. Empty input is a valid password; input
    /// longer than bcrypt can take is refused rather than cut short.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        bcrypt::non_truncating_hash(plaintext, self.cost)
            .map_err(|e| AuthError::HashingFailure(e.to_string()))
    }

    /// Check a plaintext password against a stored digest.
    ///
    /// A corrupted or foreign digest is a mismatch, not an error. So is a
    /// plaintext too long to have been hashed.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        match bcrypt::non_truncating_verify(plaintext, digest) {
            Ok(matches) => matches,
            Err(bcrypt::BcryptError::Truncation(len)) => {
                tracing::debug!("Rejected {} byte password", len);
                false
            }
            Err(e) => {
                tracing::warn!("Stored password digest could not be checked: {}", e);
                false
            }
        }
    }

    /// [`hash`](Self::hash) on the blocking pool
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AuthError::HashingFailure(e.to_string()))?
    }

    /// [`verify`](Self::verify) on the blocking pool
    pub async fn verify_blocking(&self, plaintext: String, digest: String) -> Result<bool> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &digest))
            .await
            .map_err(|e| AuthError::HashingFailure(e.to_string()))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}
