//! Secondary admin password check.

use std::fmt;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{CoreError, Result};

/// Holds the SHA-256 digest of the admin secret. The secret itself is never
/// kept in memory.
#[derive(Clone)]
pub struct AdminChallenge {
    expected_digest: [u8; 32],
}

impl AdminChallenge {
    /// Parses a 64-character hex SHA-256 digest.
    pub fn from_hex_digest(hex_digest: &str) -> Result<Self> {
        let bytes = hex::decode(hex_digest.trim())
            .map_err(|e| CoreError::config(format!("admin challenge digest is not hex: {}", e)))?;
        let expected_digest: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            CoreError::config(format!(
                "admin challenge digest must be 32 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { expected_digest })
    }

    pub fn from_secret(secret: &str) -> Self {
        Self {
            expected_digest: Sha256::digest(secret.as_bytes()).into(),
        }
    }

    /// Constant-time comparison of the candidate's digest.
    pub fn verify(&self, candidate: &str) -> bool {
        let digest = Sha256::digest(candidate.as_bytes());
        digest.as_slice().ct_eq(&self.expected_digest).into()
    }
}

impl fmt::Debug for AdminChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminChallenge")
            .field("expected_digest", &"<redacted>")
            .finish()
    }
}
