//! Secure random number generation.
//!
//! All randomness comes from the operating system CSPRNG.

use crate::{CryptoError, IV_SIZE, KEY_MATERIAL_SIZE};
use zeroize::Zeroizing;

/// Fill a buffer with random bytes from the OS CSPRNG.
///
/// # Errors
///
/// Returns [`CryptoError::RandomFailed`] if the underlying OS CSPRNG fails.
pub fn fill_random(buf: &mut [u8]) -> Result<(), CryptoError> {
    getrandom::getrandom(buf).map_err(|_| CryptoError::RandomFailed)
}

/// Generate a random 16-byte IV.
///
/// # Errors
///
/// Returns [`CryptoError::RandomFailed`] if the underlying OS CSPRNG fails.
pub fn random_iv() -> Result<[u8; IV_SIZE], CryptoError> {
    let mut buf = [0u8; IV_SIZE];
    fill_random(&mut buf)?;
    Ok(buf)
}

/// Generate 64 bytes of fresh key material, wiped on drop.
///
/// # Errors
///
/// Returns [`CryptoError::RandomFailed`] if the underlying OS CSPRNG fails.
pub fn random_key_material() -> Result<Zeroizing<[u8; KEY_MATERIAL_SIZE]>, CryptoError> {
    let mut buf = Zeroizing::new([0u8; KEY_MATERIAL_SIZE]);
    fill_random(&mut buf[..])?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_iv_varies() {
        let a = random_iv().unwrap();
        let b = random_iv().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_random_key_material_not_zero() {
        let material = random_key_material().unwrap();
        assert_ne!(*material, [0u8; KEY_MATERIAL_SIZE]);
    }

    #[test]
    fn test_fill_random_empty_buffer() {
        let mut buf = [0u8; 0];
        assert!(fill_random(&mut buf).is_ok());
    }
}
