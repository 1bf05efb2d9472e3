//! File cipher error types.

use ske_crypto::CryptoError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File cipher errors
#[derive(Debug, Error)]
pub enum FileError {
    /// Open, stat, map, resize, or flush failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File the operation was acting on
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Error from the envelope cipher
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Input and output resolve to the same file
    #[error("input and output are the same file: {}", .0.display())]
    SameFile(PathBuf),
}

impl FileError {
    /// Whether the input failed authentication (tampered data or wrong key pair).
    #[must_use]
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::Crypto(err) if err.is_authentication_failure())
    }

    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        Self::Crypto(CryptoError::InvalidInput(msg.into()))
    }
}
