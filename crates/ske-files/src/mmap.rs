//! Memory-mapped region backend (`memmap2`).
//!
//! Regions are mapped shared, so ciphertext is written straight into the
//! page cache with no intermediate buffer. Zero-length regions are never
//! handed to `mmap(2)`, which rejects them; they become empty views.

use crate::FileError;
use crate::region::{FileRegion, RegionMapper, WritableRegion};
use memmap2::{Mmap, MmapMut, MmapOptions};
use std::fs::File;
use std::io;
use std::ops::{Deref, DerefMut};

/// Maps file regions with `mmap(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MmapMapper;

/// Read-only mapping of a region.
#[derive(Debug)]
pub enum MmapRead {
    /// Mapped pages
    Mapped(Mmap),
    /// Zero-length region
    Empty,
}

impl Deref for MmapRead {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(map) => &map[..],
            Self::Empty => &[],
        }
    }
}

/// Writable mapping of a region.
#[derive(Debug)]
pub enum MmapWrite {
    /// Mapped pages
    Mapped(MmapMut),
    /// Zero-length region
    Empty,
}

impl Deref for MmapWrite {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(map) => &map[..],
            Self::Empty => &[],
        }
    }
}

impl DerefMut for MmapWrite {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Mapped(map) => &mut map[..],
            Self::Empty => &mut [],
        }
    }
}

impl WritableRegion for MmapWrite {
    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Mapped(map) => map.flush(),
            Self::Empty => Ok(()),
        }
    }
}

impl RegionMapper for MmapMapper {
    type Read = MmapRead;
    type Write = MmapWrite;

    fn name(&self) -> &'static str {
        "mmap"
    }

    fn map_read(&self, file: &File, region: &FileRegion) -> Result<MmapRead, FileError> {
        if region.is_empty() {
            return Ok(MmapRead::Empty);
        }

        // SAFETY: The mapping is read-only and lives no longer than this call's
        // borrow of the file. Concurrent truncation or modification of the file
        // by another process is outside the cipher's contract, as with any
        // mmap-based reader: the slice may change between reads of it.
        let map = unsafe {
            MmapOptions::new()
                .offset(region.offset())
                .len(region.len())
                .map(file)
        }
        .map_err(FileError::io(region.path()))?;

        Ok(MmapRead::Mapped(map))
    }

    fn map_write(&self, file: &File, region: &FileRegion) -> Result<MmapWrite, FileError> {
        if region.is_empty() {
            return Ok(MmapWrite::Empty);
        }

        // SAFETY: The caller sized the file to cover the region before mapping, and
        // the output file is opened exclusively by this operation.
        let map = unsafe {
            MmapOptions::new()
                .offset(region.offset())
                .len(region.len())
                .map_mut(file)
        }
        .map_err(FileError::io(region.path()))?;

        Ok(MmapWrite::Mapped(map))
    }
}
