//! File regions and the backends that expose them as byte slices.
//!
//! A [`FileRegion`] names the sub-range of a file that takes part in an
//! operation. Bytes before `offset` belong to the caller (typically a
//! header) and are never read or written by the cipher.
//!
//! A [`RegionMapper`] turns a region of an open file into a slice:
//!
//! | Backend | Read | Write |
//! |---------|------|-------|
//! | [`MmapMapper`](crate::mmap::MmapMapper) | shared read-only mapping | shared writable mapping, `msync` on flush |
//! | [`BufferedMapper`](crate::buffered::BufferedMapper) | one read into a `Vec` | `Vec`, written back at the offset on flush |

use crate::FileError;
use std::fs::File;
use std::io;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

/// A byte range of a file: `[offset, offset + len)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRegion {
    path: PathBuf,
    offset: u64,
    len: usize,
}

impl FileRegion {
    /// Describe `len` bytes of `path` starting at `offset`.
    pub fn new(path: impl Into<PathBuf>, offset: u64, len: usize) -> Self {
        Self {
            path: path.into(),
            offset,
            len,
        }
    }

    /// File the region belongs to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First byte of the region.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Region length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the region covers no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last byte of the region, or `None` if that lies beyond
    /// `u64::MAX`.
    #[must_use]
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.len as u64)
    }
}

/// A writable view of a region; changes reach the file on [`flush`](Self::flush).
pub trait WritableRegion: DerefMut<Target = [u8]> {
    /// Write the region back to durable storage.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the data could not be persisted.
    fn flush(&mut self) -> io::Result<()>;
}

/// Backend that maps a byte range of a file for reading or writing.
///
/// `file` must already be open with the access the mapping needs and, for
/// writes, already sized to cover the region.
pub trait RegionMapper {
    /// Read-only view returned by [`map_read`](Self::map_read).
    type Read: Deref<Target = [u8]>;
    /// Writable view returned by [`map_write`](Self::map_write).
    type Write: WritableRegion;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Expose `region` of `file` for reading.
    ///
    /// # Errors
    ///
    /// Returns `FileError::Io` if the region cannot be mapped or read.
    fn map_read(&self, file: &File, region: &FileRegion) -> Result<Self::Read, FileError>;

    /// Expose `region` of `file` for writing.
    ///
    /// # Errors
    ///
    /// Returns `FileError::Io` if the region cannot be mapped.
    fn map_write(&self, file: &File, region: &FileRegion) -> Result<Self::Write, FileError>;
}
