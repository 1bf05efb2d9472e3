//! Key pair generation and derivation.
//!
//! A [`KeyPair`] holds the AES-256-CTR encryption key and the HMAC-SHA256
//! authentication key. It is produced either from fresh OS randomness or
//! deterministically from caller-supplied entropy:
//!
//! ```text
//! random:   material = OsRng(64)
//! derived:  material = HMAC-SHA512(key = DerivationKey, msg = entropy)
//!
//! enc_key = material[0..32]
//! mac_key = material[32..64]
//! ```
//!
//! Both paths split the 64 bytes the same way, which is also the layout of
//! [`KeyPair::to_bytes`].
//!
//! The [`DerivationKey`] is a domain-separation secret. It must come from
//! configuration; the derivation path refuses to run without one.

use crate::constant_time::ct_eq;
use crate::random::random_key_material;
use crate::{CryptoError, KEY_MATERIAL_SIZE, KEY_SIZE, MIN_DERIVATION_KEY_SIZE};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

type HmacSha512 = Hmac<Sha512>;

/// Encryption and authentication keys for one session.
///
/// Immutable once created. Key bytes are zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    enc_key: [u8; KEY_SIZE],
    mac_key: [u8; KEY_SIZE],
}

impl KeyPair {
    /// Build a key pair from its two halves.
    #[must_use]
    pub fn new(enc_key: [u8; KEY_SIZE], mac_key: [u8; KEY_SIZE]) -> Self {
        Self { enc_key, mac_key }
    }

    /// Split 64 bytes of key material into `enc_key ‖ mac_key`.
    #[must_use]
    pub fn from_bytes(material: &[u8; KEY_MATERIAL_SIZE]) -> Self {
        let mut enc_key = [0u8; KEY_SIZE];
        let mut mac_key = [0u8; KEY_SIZE];
        enc_key.copy_from_slice(&material[..KEY_SIZE]);
        mac_key.copy_from_slice(&material[KEY_SIZE..]);
        Self { enc_key, mac_key }
    }

    /// Create from a 64-byte slice.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` if slice length is not 64 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        let material: &[u8; KEY_MATERIAL_SIZE] =
            slice.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: KEY_MATERIAL_SIZE,
                actual: slice.len(),
            })?;
        Ok(Self::from_bytes(material))
    }

    /// Generate a random key pair from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::RandomFailed`] if the OS CSPRNG fails.
    pub fn generate() -> Result<Self, CryptoError> {
        let material = random_key_material()?;
        Ok(Self::from_bytes(&material))
    }

    /// Deterministically derive a key pair from `entropy`.
    ///
    /// The same entropy and secret always yield the same key pair.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` if the HMAC backend rejects
    /// the secret (it never does for a validated [`DerivationKey`]).
    pub fn derive(entropy: &[u8], secret: &DerivationKey) -> Result<Self, CryptoError> {
        let mut mac = <HmacSha512 as Mac>::new_from_slice(&secret.0).map_err(|_| {
            CryptoError::InvalidKeyLength {
                expected: MIN_DERIVATION_KEY_SIZE,
                actual: secret.len(),
            }
        })?;
        mac.update(entropy);

        let mut output = mac.finalize().into_bytes();
        let mut material = Zeroizing::new([0u8; KEY_MATERIAL_SIZE]);
        material.copy_from_slice(&output);
        output.as_mut_slice().zeroize();

        Ok(Self::from_bytes(&material))
    }

    /// AES-256-CTR key.
    ///
    /// # Security
    ///
    /// Handle with extreme care - this exposes the raw key material.
    #[must_use]
    pub fn enc_key(&self) -> &[u8; KEY_SIZE] {
        &self.enc_key
    }

    /// HMAC-SHA256 key.
    #[must_use]
    pub fn mac_key(&self) -> &[u8; KEY_SIZE] {
        &self.mac_key
    }

    /// Serialize as `enc_key ‖ mac_key`.
    #[must_use]
    pub fn to_bytes(&self) -> Zeroizing<[u8; KEY_MATERIAL_SIZE]> {
        let mut out = Zeroizing::new([0u8; KEY_MATERIAL_SIZE]);
        out[..KEY_SIZE].copy_from_slice(&self.enc_key);
        out[KEY_SIZE..].copy_from_slice(&self.mac_key);
        out
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        ct_eq(&self.enc_key, &other.enc_key) & ct_eq(&self.mac_key, &other.mac_key)
    }
}

impl Eq for KeyPair {}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("enc_key", &"<redacted>")
            .field("mac_key", &"<redacted>")
            .finish()
    }
}

/// Domain-separation secret for the entropy derivation path.
///
/// Loaded from configuration at runtime. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivationKey(Vec<u8>);

impl DerivationKey {
    /// Wrap a secret of at least [`MIN_DERIVATION_KEY_SIZE`] bytes.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` if the secret is too short.
    pub fn new(secret: Vec<u8>) -> Result<Self, CryptoError> {
        if secret.len() < MIN_DERIVATION_KEY_SIZE {
            let actual = secret.len();
            drop(Zeroizing::new(secret));
            return Err(CryptoError::InvalidKeyLength {
                expected: MIN_DERIVATION_KEY_SIZE,
                actual,
            });
        }
        Ok(Self(secret))
    }

    /// Create from a borrowed slice.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` if the secret is too short.
    pub fn from_slice(secret: &[u8]) -> Result<Self, CryptoError> {
        Self::new(secret.to_vec())
    }

    /// Secret length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a constructed key; present for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for DerivationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivationKey(<{} bytes redacted>)", self.0.len())
    }
}

/// Produce a key pair: derived from `entropy` when given, random otherwise.
///
/// # Errors
///
/// Returns [`CryptoError::RandomFailed`] on the random path if the OS
/// CSPRNG fails.
pub fn derive_key_pair(
    entropy: Option<&[u8]>,
    secret: &DerivationKey,
) -> Result<KeyPair, CryptoError> {
    match entropy {
        Some(entropy) => KeyPair::derive(entropy, secret),
        None => KeyPair::generate(),
    }
}
