//! # SKE Files
//!
//! File cipher for SKE.
//!
//! This crate provides:
//! - Whole-file encrypt/decrypt around the `ske-crypto` envelope
//! - Offset composition, so a caller-defined header can precede the envelope
//! - Verify-before-write decryption: a file that fails authentication never
//!   produces an output file
//! - Pluggable region mapping (memory-mapped or buffered)
//!
//! ## Usage
//!
//! ```no_run
//! use ske_crypto::KeyPair;
//! use std::path::Path;
//!
//! let keys = KeyPair::generate().unwrap();
//! ske_files::encrypt_file(Path::new("secret.enc"), Path::new("secret.txt"), &keys, None, 0)
//!     .unwrap();
//! ske_files::decrypt_file(Path::new("secret.out"), Path::new("secret.enc"), &keys, 0).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffered;
pub mod cipher;
pub mod error;
pub mod mmap;
pub mod region;

pub use buffered::BufferedMapper;
pub use cipher::{FileCipher, decrypt_file, encrypt_file, min_encrypted_len};
pub use error::FileError;
pub use mmap::MmapMapper;
pub use region::{FileRegion, RegionMapper, WritableRegion};
