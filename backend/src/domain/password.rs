//! Credential hashing and verification.
//!
//! Wraps Argon2 so the rest of the crate never touches hashing primitives
//! directly. Verification is delegated to the algorithm's own comparison
//! routine, which runs in constant time relative to the secret; a mismatch is
//! a normal outcome, not a failure. Neither plaintexts nor hash material are
//! ever logged.

use argon2::password_hash::{PasswordHash, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier as _};

/// Raised when the hashing primitive itself fails (bad salt, malformed
/// stored hash, parameter error). Distinct from a mismatch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("password hashing failed: {message}")]
pub struct HashingError {
    message: String,
}

impl HashingError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outcome of comparing a plaintext against a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The plaintext matches the stored hash.
    Verified,
    /// The plaintext does not match. A normal outcome, mapped to an
    /// invalid-credentials signal by callers.
    Mismatch,
}

/// One-way password hasher with fixed adaptive-cost parameters.
#[derive(Debug, Clone, Default)]
pub struct CredentialHasher {
    inner: Argon2<'static>,
}

impl CredentialHasher {
    /// Construct a hasher with the default Argon2id parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a plaintext into a self-describing PHC string.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashingError> {
        let salt = SaltString::generate(&mut OsRng);
        let hashed = self
            .inner
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| HashingError::new(err.to_string()))?;
        Ok(hashed.to_string())
    }

    /// Compare `plaintext` against a stored PHC string.
    pub fn verify(&self, stored: &str, plaintext: &str) -> Result<VerifyOutcome, HashingError> {
        let parsed =
            PasswordHash::new(stored).map_err(|err| HashingError::new(err.to_string()))?;
        match self.inner.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(VerifyOutcome::Verified),
            Err(argon2::password_hash::Error::Password) => Ok(VerifyOutcome::Mismatch),
            Err(err) => Err(HashingError::new(err.to_string())),
        }
    }
}
