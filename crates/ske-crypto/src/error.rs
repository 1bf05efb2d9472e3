//! Cryptographic error types.

use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Envelope tag did not match (tampered data or wrong key pair)
    #[error("decryption failed: authentication failure")]
    AuthenticationFailed,

    /// Envelope, region, or output buffer too short for the operation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Invalid key length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Invalid IV length
    #[error("invalid IV length: expected 16, got {0}")]
    InvalidIvLength(usize),

    /// Random number generation failed
    #[error("random number generation failed")]
    RandomFailed,
}

impl CryptoError {
    /// Whether this error means the ciphertext must be treated as untrusted.
    #[must_use]
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed)
    }
}
