//! Buffered region backend.
//!
//! Reads the region into a `Vec` and writes it back at the region offset on
//! flush. One extra copy compared to [`MmapMapper`](crate::mmap::MmapMapper),
//! but works on files that cannot be memory mapped (pipes excepted, since
//! the region must be seekable).

use crate::FileError;
use crate::region::{FileRegion, RegionMapper, WritableRegion};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::ops::{Deref, DerefMut};

/// Maps file regions through plain reads and writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferedMapper;

/// Region contents copied into memory.
#[derive(Debug)]
pub struct BufferedRead(Vec<u8>);

impl Deref for BufferedRead {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// In-memory region written back to the file on [`flush`](WritableRegion::flush).
#[derive(Debug)]
pub struct BufferedWrite {
    file: File,
    offset: u64,
    buf: Vec<u8>,
}

impl Deref for BufferedWrite {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl DerefMut for BufferedWrite {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl WritableRegion for BufferedWrite {
    fn flush(&mut self) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(self.offset))?;
        self.file.write_all(&self.buf)?;
        self.file.sync_data()
    }
}

impl RegionMapper for BufferedMapper {
    type Read = BufferedRead;
    type Write = BufferedWrite;

    fn name(&self) -> &'static str {
        "buffered"
    }

    fn map_read(&self, file: &File, region: &FileRegion) -> Result<BufferedRead, FileError> {
        let mut buf = vec![0u8; region.len()];
        let mut reader = file;
        reader
            .seek(SeekFrom::Start(region.offset()))
            .and_then(|_| reader.read_exact(&mut buf))
            .map_err(FileError::io(region.path()))?;

        Ok(BufferedRead(buf))
    }

    fn map_write(&self, file: &File, region: &FileRegion) -> Result<BufferedWrite, FileError> {
        let file = file.try_clone().map_err(FileError::io(region.path()))?;

        Ok(BufferedWrite {
            file,
            offset: region.offset(),
            buf: vec![0u8; region.len()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use tempfile::NamedTempFile;

    #[test]
    fn test_map_read_region() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"0123456789").unwrap();
        tmp.flush().unwrap();

        let file = File::open(tmp.path()).unwrap();
        let view = BufferedMapper
            .map_read(&file, &FileRegion::new(tmp.path(), 3, 4))
            .unwrap();
        assert_eq!(&*view, b"3456");
    }

    #[test]
    fn test_map_read_past_end_fails() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"short").unwrap();
        tmp.flush().unwrap();

        let file = File::open(tmp.path()).unwrap();
        let err = BufferedMapper
            .map_read(&file, &FileRegion::new(tmp.path(), 2, 10))
            .unwrap_err();
        assert!(matches!(err, FileError::Io { .. }));
    }

    #[test]
    fn test_write_lands_at_offset_on_flush() {
        let tmp = NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), b"HEAD____").unwrap();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(tmp.path())
            .unwrap();

        let mut view = BufferedMapper
            .map_write(&file, &FileRegion::new(tmp.path(), 4, 4))
            .unwrap();
        view.copy_from_slice(b"BODY");
        assert_eq!(std::fs::read(tmp.path()).unwrap(), b"HEAD____");

        view.flush().unwrap();
        assert_eq!(std::fs::read(tmp.path()).unwrap(), b"HEADBODY");
    }
}
