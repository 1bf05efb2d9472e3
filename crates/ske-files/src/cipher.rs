//! Whole-file encryption and decryption.
//!
//! An encrypted file is an optional caller-defined header followed by one
//! envelope filling the rest of the file:
//!
//! ```text
//! +------------------+------+--------------------+-----------+
//! | header (offset)  | IV   | ciphertext (N)     | tag (32B) |
//! +------------------+------+--------------------+-----------+
//! ```
//!
//! Decryption verifies the tag over the mapped input before the output file
//! is created, so a tampered or mis-keyed input never leaves a partial
//! plaintext behind.

use crate::FileError;
use crate::mmap::MmapMapper;
use crate::region::{FileRegion, RegionMapper, WritableRegion};
use ske_crypto::envelope::{Envelope, Iv, encrypt_into, envelope_len, plaintext_len};
use ske_crypto::{ENVELOPE_OVERHEAD, KeyPair};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// File cipher over a region mapping backend.
#[derive(Debug, Clone, Default)]
pub struct FileCipher<M: RegionMapper = MmapMapper> {
    mapper: M,
}

impl<M: RegionMapper> FileCipher<M> {
    /// Create a file cipher using `mapper` for all file access.
    pub fn new(mapper: M) -> Self {
        Self { mapper }
    }

    /// Backend in use.
    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    /// Encrypt `input` into `output`, placing the envelope at `output_offset`.
    ///
    /// The output file is created if missing and resized to exactly
    /// `output_offset + envelope_len(input_size)` bytes. Bytes before
    /// `output_offset` in an existing output file are preserved. A random
    /// IV is drawn when `iv` is `None`.
    ///
    /// # Errors
    ///
    /// - `FileError::SameFile` if `input` and `output` are the same file
    /// - `FileError::Crypto(CryptoError::InvalidInput)` if `output_offset`
    ///   plus the envelope length does not fit in a `u64`; the output file
    ///   is not opened
    /// - `FileError::Io` on any open, resize, map, or flush failure
    /// - `FileError::Crypto` if the IV could not be generated
    pub fn encrypt_file(
        &self,
        output: &Path,
        input: &Path,
        keys: &KeyPair,
        iv: Option<&Iv>,
        output_offset: u64,
    ) -> Result<(), FileError> {
        reject_same_file(input, output)?;

        let iv = match iv {
            Some(iv) => *iv,
            None => Iv::generate()?,
        };

        let in_file = File::open(input).map_err(FileError::io(input))?;
        let in_len = file_len(&in_file, input)?;
        let in_region = FileRegion::new(input, 0, to_usize(in_len, input)?);
        let plaintext = self.mapper.map_read(&in_file, &in_region)?;
        debug!(
            backend = self.mapper.name(),
            path = %input.display(),
            len = in_region.len(),
            "mapped input"
        );

        let out_region = FileRegion::new(output, output_offset, envelope_len(in_region.len()));
        let out_size = out_region.end().ok_or_else(|| {
            FileError::invalid_input(format!(
                "output offset {output_offset} + envelope length {} overflows",
                out_region.len()
            ))
        })?;
        let out_file = open_output(output, false)?;
        out_file.set_len(out_size).map_err(FileError::io(output))?;
        debug!(
            path = %output.display(),
            offset = output_offset,
            size = out_size,
            "resized output"
        );

        let mut envelope = self.mapper.map_write(&out_file, &out_region)?;
        let written = encrypt_into(&*plaintext, &mut *envelope, keys, Some(&iv))?;
        envelope.flush().map_err(FileError::io(output))?;

        info!(
            input = %input.display(),
            output = %output.display(),
            plaintext_bytes = in_region.len(),
            envelope_bytes = written,
            offset = output_offset,
            "encrypted file"
        );
        Ok(())
    }

    /// Decrypt the envelope starting at `input_offset` of `input` into `output`.
    ///
    /// The tag is checked before `output` is opened; on any failure up to and
    /// including verification the output path is left untouched. On success
    /// the output file holds exactly the plaintext.
    ///
    /// With [`MmapMapper`] the tag is checked over a shared mapping of the
    /// input, and decryption reads the same pages again afterwards. Another
    /// process writing to `input` between the two steps can change the bytes
    /// that get decrypted after they were authenticated. Use
    /// [`BufferedMapper`](crate::buffered::BufferedMapper), which copies the
    /// region once, when the input may be modified concurrently.
    ///
    /// # Errors
    ///
    /// - `FileError::SameFile` if `input` and `output` are the same file
    /// - `FileError::Crypto(CryptoError::InvalidInput)` if `input_offset` lies
    ///   past the end of the file or fewer than 48 bytes follow it
    /// - `FileError::Crypto(CryptoError::AuthenticationFailed)` on tag mismatch
    /// - `FileError::Io` on any open, resize, map, or flush failure
    pub fn decrypt_file(
        &self,
        output: &Path,
        input: &Path,
        keys: &KeyPair,
        input_offset: u64,
    ) -> Result<(), FileError> {
        reject_same_file(input, output)?;

        let in_file = File::open(input).map_err(FileError::io(input))?;
        let in_len = file_len(&in_file, input)?;
        let region_len = in_len.checked_sub(input_offset).ok_or_else(|| {
            FileError::invalid_input(format!(
                "offset {input_offset} is past the end of {} ({in_len} bytes)",
                input.display()
            ))
        })?;
        let in_region = FileRegion::new(input, input_offset, to_usize(region_len, input)?);
        let plain_len = plaintext_len(in_region.len())?;

        let mapped = self.mapper.map_read(&in_file, &in_region)?;
        debug!(
            backend = self.mapper.name(),
            path = %input.display(),
            offset = input_offset,
            len = in_region.len(),
            "mapped envelope"
        );

        let verified = Envelope::parse(&*mapped)?.verify(keys).inspect_err(|_| {
            warn!(path = %input.display(), "envelope failed authentication");
        })?;

        let out_file = open_output(output, true)?;
        out_file
            .set_len(plain_len as u64)
            .map_err(FileError::io(output))?;

        let mut plaintext = self
            .mapper
            .map_write(&out_file, &FileRegion::new(output, 0, plain_len))?;
        verified.decrypt_into(&mut *plaintext)?;
        plaintext.flush().map_err(FileError::io(output))?;

        info!(
            input = %input.display(),
            output = %output.display(),
            plaintext_bytes = plain_len,
            offset = input_offset,
            "decrypted file"
        );
        Ok(())
    }
}

/// Encrypt `input` into `output` at `output_offset` using memory mapping.
///
/// See [`FileCipher::encrypt_file`].
///
/// # Errors
///
/// See [`FileCipher::encrypt_file`].
pub fn encrypt_file(
    output: &Path,
    input: &Path,
    keys: &KeyPair,
    iv: Option<&Iv>,
    output_offset: u64,
) -> Result<(), FileError> {
    FileCipher::<MmapMapper>::default().encrypt_file(output, input, keys, iv, output_offset)
}

/// Decrypt the envelope at `input_offset` of `input` into `output` using
/// memory mapping.
///
/// See [`FileCipher::decrypt_file`].
///
/// # Errors
///
/// See [`FileCipher::decrypt_file`].
pub fn decrypt_file(
    output: &Path,
    input: &Path,
    keys: &KeyPair,
    input_offset: u64,
) -> Result<(), FileError> {
    FileCipher::<MmapMapper>::default().decrypt_file(output, input, keys, input_offset)
}

/// Size of the smallest valid encrypted file for a given header length, or
/// `None` if it does not fit in a `u64`.
#[must_use]
pub const fn min_encrypted_len(offset: u64) -> Option<u64> {
    offset.checked_add(ENVELOPE_OVERHEAD as u64)
}

fn open_output(path: &Path, truncate: bool) -> Result<File, FileError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(truncate)
        .open(path)
        .map_err(FileError::io(path))
}

fn file_len(file: &File, path: &Path) -> Result<u64, FileError> {
    file.metadata()
        .map(|meta| meta.len())
        .map_err(FileError::io(path))
}

fn to_usize(len: u64, path: &Path) -> Result<usize, FileError> {
    usize::try_from(len).map_err(|_| {
        FileError::invalid_input(format!(
            "{} is too large to map ({len} bytes)",
            path.display()
        ))
    })
}

fn reject_same_file(input: &Path, output: &Path) -> Result<(), FileError> {
    let out_meta = match fs::metadata(output) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(FileError::io(output)(err)),
    };
    let in_meta = fs::metadata(input).map_err(FileError::io(input))?;

    if is_same_file(&in_meta, &out_meta, input, output)? {
        return Err(FileError::SameFile(output.to_path_buf()));
    }
    Ok(())
}

#[cfg(unix)]
fn is_same_file(
    a: &fs::Metadata,
    b: &fs::Metadata,
    _a_path: &Path,
    _b_path: &Path,
) -> Result<bool, FileError> {
    use std::os::unix::fs::MetadataExt;
    Ok(a.dev() == b.dev() && a.ino() == b.ino())
}

#[cfg(not(unix))]
fn is_same_file(
    _a: &fs::Metadata,
    _b: &fs::Metadata,
    a_path: &Path,
    b_path: &Path,
) -> Result<bool, FileError> {
    let a = fs::canonicalize(a_path).map_err(FileError::io(a_path))?;
    let b = fs::canonicalize(b_path).map_err(FileError::io(b_path))?;
    Ok(a == b)
}
