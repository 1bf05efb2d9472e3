//! Encrypt-then-MAC envelopes (AES-256-CTR + HMAC-SHA256).
//!
//! Encryption is length-preserving (counter mode, no padding), so every
//! envelope is exactly [`ENVELOPE_OVERHEAD`] bytes longer than its
//! plaintext:
//!
//! ```text
//! +------------+-------------------------+---------------------------+
//! | IV (16B)   | C = AES-CTR(plaintext)  | HMAC-SHA256(IV ‖ C) (32B) |
//! +------------+-------------------------+---------------------------+
//! ```
//!
//! ## Verification Order
//!
//! Received bytes start out as an [`Envelope`] (unverified). The only way
//! to get a [`VerifiedEnvelope`] is [`Envelope::verify`], and only a
//! verified envelope can be decrypted. Keystream is never applied to
//! ciphertext whose tag has not been checked.
//!
//! ## Usage
//!
//! ```rust
//! use ske_crypto::envelope::{Envelope, Iv, encrypt};
//! use ske_crypto::keys::KeyPair;
//!
//! let keys = KeyPair::new([1u8; 32], [2u8; 32]);
//! let sealed = encrypt(b"hello", &keys, Some(&Iv::from_bytes([0u8; 16]))).unwrap();
//!
//! let verified = Envelope::parse(&sealed).unwrap().verify(&keys).unwrap();
//! assert_eq!(verified.decrypt().unwrap(), b"hello");
//! ```

use crate::constant_time::verify_32;
use crate::keys::KeyPair;
use crate::random::random_iv;
use crate::{CryptoError, ENVELOPE_OVERHEAD, IV_SIZE, KEY_SIZE, TAG_SIZE};
use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// AES-CTR initialization vector (16 bytes).
///
/// Must be unique per key pair; [`Iv::generate`] draws it from the OS CSPRNG.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Iv([u8; IV_SIZE]);

impl Iv {
    /// Create an IV from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; IV_SIZE]) -> Self {
        Self(bytes)
    }

    /// Create an IV from a slice.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidIvLength` if slice length is not 16 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; IV_SIZE] = slice
            .try_into()
            .map_err(|_| CryptoError::InvalidIvLength(slice.len()))?;
        Ok(Self(bytes))
    }

    /// Generate a random IV.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::RandomFailed`] if the OS CSPRNG fails.
    pub fn generate() -> Result<Self, CryptoError> {
        random_iv().map(Self)
    }

    /// Get raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; IV_SIZE] {
        &self.0
    }
}

/// Length of the envelope produced for a plaintext of `plaintext_len` bytes.
#[must_use]
pub const fn envelope_len(plaintext_len: usize) -> usize {
    plaintext_len + ENVELOPE_OVERHEAD
}

/// Length of the plaintext carried by an envelope of `envelope_len` bytes.
///
/// # Errors
///
/// Returns `CryptoError::InvalidInput` if the envelope cannot hold an IV
/// and a tag.
pub fn plaintext_len(envelope_len: usize) -> Result<usize, CryptoError> {
    envelope_len.checked_sub(ENVELOPE_OVERHEAD).ok_or_else(|| {
        CryptoError::InvalidInput(format!(
            "envelope of {envelope_len} bytes is shorter than the {ENVELOPE_OVERHEAD}-byte overhead"
        ))
    })
}

fn keystream(enc_key: &[u8; KEY_SIZE], iv: &Iv) -> Aes256Ctr {
    Aes256Ctr::new(enc_key.into(), iv.as_bytes().into())
}

fn compute_tag(
    mac_key: &[u8; KEY_SIZE],
    iv_and_ciphertext: &[u8],
) -> Result<[u8; TAG_SIZE], CryptoError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(mac_key).map_err(|_| {
        CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: mac_key.len(),
        }
    })?;
    mac.update(iv_and_ciphertext);
    Ok(mac.finalize().into_bytes().into())
}

/// Encrypt `plaintext` into `out`, returning the number of bytes written.
///
/// `out` must hold at least [`envelope_len`]`(plaintext.len())` bytes; the
/// ciphertext is written straight into it without an intermediate buffer.
/// A random IV is drawn when `iv` is `None`.
///
/// # Errors
///
/// Returns `CryptoError::InvalidInput` if `out` is too small, or
/// [`CryptoError::RandomFailed`] if an IV could not be generated.
pub fn encrypt_into(
    plaintext: &[u8],
    out: &mut [u8],
    keys: &KeyPair,
    iv: Option<&Iv>,
) -> Result<usize, CryptoError> {
    let total = envelope_len(plaintext.len());
    if out.len() < total {
        return Err(CryptoError::InvalidInput(format!(
            "output buffer holds {} bytes, envelope needs {total}",
            out.len()
        )));
    }

    let iv = match iv {
        Some(iv) => *iv,
        None => Iv::generate()?,
    };

    let (body, tag_out) = out[..total].split_at_mut(total - TAG_SIZE);
    let (iv_out, ciphertext_out) = body.split_at_mut(IV_SIZE);
    iv_out.copy_from_slice(iv.as_bytes());
    keystream(keys.enc_key(), &iv)
        .apply_keystream_b2b(plaintext, ciphertext_out)
        .map_err(|_| CryptoError::InvalidInput("keystream length mismatch".into()))?;

    let tag = compute_tag(keys.mac_key(), body)?;
    tag_out.copy_from_slice(&tag);

    Ok(total)
}

/// Encrypt `plaintext` into a freshly allocated envelope.
///
/// # Errors
///
/// Returns [`CryptoError::RandomFailed`] if an IV could not be generated.
pub fn encrypt(
    plaintext: &[u8],
    keys: &KeyPair,
    iv: Option<&Iv>,
) -> Result<Vec<u8>, CryptoError> {
    let mut out = vec![0u8; envelope_len(plaintext.len())];
    encrypt_into(plaintext, &mut out, keys, iv)?;
    Ok(out)
}

/// Verify and decrypt `envelope` into `out`, returning the plaintext length.
///
/// `out` is written only after the tag has been verified.
///
/// # Errors
///
/// - `CryptoError::InvalidInput` if the envelope is shorter than
///   [`ENVELOPE_OVERHEAD`] or `out` cannot hold the plaintext
/// - `CryptoError::AuthenticationFailed` if the tag does not match
pub fn decrypt_into(
    envelope: &[u8],
    out: &mut [u8],
    keys: &KeyPair,
) -> Result<usize, CryptoError> {
    let parsed = Envelope::parse(envelope)?;
    if out.len() < parsed.plaintext_len() {
        return Err(CryptoError::InvalidInput(format!(
            "output buffer holds {} bytes, plaintext needs {}",
            out.len(),
            parsed.plaintext_len()
        )));
    }
    parsed.verify(keys)?.decrypt_into(out)
}

/// Verify and decrypt `envelope` into a freshly allocated buffer.
///
/// # Errors
///
/// - `CryptoError::InvalidInput` if the envelope is shorter than
///   [`ENVELOPE_OVERHEAD`]
/// - `CryptoError::AuthenticationFailed` if the tag does not match
pub fn decrypt(envelope: &[u8], keys: &KeyPair) -> Result<Vec<u8>, CryptoError> {
    Envelope::parse(envelope)?.verify(keys)?.decrypt()
}

/// A received envelope whose tag has not been checked yet.
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'a> {
    iv: Iv,
    authenticated: &'a [u8],
    ciphertext: &'a [u8],
    tag: &'a [u8; TAG_SIZE],
}

impl<'a> Envelope<'a> {
    /// Split raw bytes into IV, ciphertext, and tag.
    ///
    /// No cryptographic work is done here.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidInput` if `bytes` is shorter than
    /// [`ENVELOPE_OVERHEAD`].
    pub fn parse(bytes: &'a [u8]) -> Result<Self, CryptoError> {
        plaintext_len(bytes.len())?;

        let (authenticated, tag) = bytes.split_at(bytes.len() - TAG_SIZE);
        let (iv, ciphertext) = authenticated.split_at(IV_SIZE);
        let tag: &[u8; TAG_SIZE] = tag
            .try_into()
            .map_err(|_| CryptoError::InvalidInput("truncated tag".into()))?;

        Ok(Self {
            iv: Iv::from_slice(iv)?,
            authenticated,
            ciphertext,
            tag,
        })
    }

    /// IV carried by the envelope.
    #[must_use]
    pub fn iv(&self) -> &Iv {
        &self.iv
    }

    /// Unverified ciphertext.
    #[must_use]
    pub fn ciphertext(&self) -> &'a [u8] {
        self.ciphertext
    }

    /// Length of the plaintext this envelope would decrypt to.
    #[must_use]
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len()
    }

    /// Check the tag in constant time.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::AuthenticationFailed` on mismatch.
    pub fn verify<'k>(self, keys: &'k KeyPair) -> Result<VerifiedEnvelope<'a, 'k>, CryptoError> {
        let expected = compute_tag(keys.mac_key(), self.authenticated)?;
        if !verify_32(&expected, self.tag) {
            return Err(CryptoError::AuthenticationFailed);
        }

        Ok(VerifiedEnvelope {
            iv: self.iv,
            ciphertext: self.ciphertext,
            keys,
        })
    }
}

/// An envelope whose tag matched; bound to the key pair that verified it.
#[derive(Debug, Clone, Copy)]
pub struct VerifiedEnvelope<'a, 'k> {
    iv: Iv,
    ciphertext: &'a [u8],
    keys: &'k KeyPair,
}

impl VerifiedEnvelope<'_, '_> {
    /// Length of the plaintext.
    #[must_use]
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len()
    }

    /// Decrypt into `out`, returning the plaintext length.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidInput` if `out` is too small.
    pub fn decrypt_into(&self, out: &mut [u8]) -> Result<usize, CryptoError> {
        let len = self.ciphertext.len();
        let target = out.get_mut(..len).ok_or_else(|| {
            CryptoError::InvalidInput(format!("output buffer too small for {len}-byte plaintext"))
        })?;

        keystream(self.keys.enc_key(), &self.iv)
            .apply_keystream_b2b(self.ciphertext, target)
            .map_err(|_| CryptoError::InvalidInput("keystream length mismatch".into()))?;

        Ok(len)
    }

    /// Decrypt into a freshly allocated buffer.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed envelope; the `Result` mirrors
    /// [`decrypt_into`](Self::decrypt_into).
    pub fn decrypt(&self) -> Result<Vec<u8>, CryptoError> {
        let mut out = vec![0u8; self.ciphertext.len()];
        self.decrypt_into(&mut out)?;
        Ok(out)
    }
}
