//! # SKE Crypto
//!
//! Cryptographic core for SKE (symmetric key encryption).
//!
//! This crate provides:
//! - Key pair generation and deterministic derivation from entropy
//! - Encrypt-then-MAC envelopes over in-memory buffers
//! - Constant-time tag verification
//! - Secure random number generation
//!
//! ## Cryptographic Suite
//!
//! | Function | Algorithm | Key Size |
//! |----------|-----------|----------|
//! | Encryption | AES-256-CTR (128-bit big-endian counter) | 256-bit |
//! | Authentication | HMAC-SHA256 over `IV ‖ C` | 256-bit |
//! | Key Derivation | HMAC-SHA512 keyed with a domain-separation secret | 512-bit output |
//!
//! ## Envelope Format
//!
//! ```text
//! +------------+-------------------------+---------------------------+
//! | IV (16B)   | C = AES-CTR(plaintext)  | HMAC-SHA256(IV ‖ C) (32B) |
//! +------------+-------------------------+---------------------------+
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use ske_crypto::envelope::{decrypt, encrypt};
//! use ske_crypto::keys::KeyPair;
//!
//! let keys = KeyPair::generate().expect("rng");
//! let sealed = encrypt(b"attack at dawn", &keys, None).expect("encrypt");
//! assert_eq!(sealed.len(), 14 + ske_crypto::ENVELOPE_OVERHEAD);
//!
//! let opened = decrypt(&sealed, &keys).expect("decrypt");
//! assert_eq!(opened, b"attack at dawn");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod constant_time;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod random;

pub use envelope::{Envelope, Iv, VerifiedEnvelope};
pub use error::CryptoError;
pub use keys::{DerivationKey, KeyPair, derive_key_pair};

/// AES-256 / HMAC key size
pub const KEY_SIZE: usize = 32;

/// AES-CTR initialization vector size
pub const IV_SIZE: usize = 16;

/// HMAC-SHA256 tag size
pub const TAG_SIZE: usize = 32;

/// Fixed per-envelope overhead (`IV_SIZE + TAG_SIZE`)
pub const ENVELOPE_OVERHEAD: usize = IV_SIZE + TAG_SIZE;

/// Raw key material consumed by a key pair (`enc_key ‖ mac_key`)
pub const KEY_MATERIAL_SIZE: usize = 2 * KEY_SIZE;

/// Minimum size of the domain-separation secret
pub const MIN_DERIVATION_KEY_SIZE: usize = 32;
