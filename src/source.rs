//! Byte access to an open file: a memory map or positioned stream reads.

use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use memmap2::{Mmap, MmapMut};
use tracing::{debug, warn};

use crate::types::AccessMode;
use crate::{Result, SegyError};

enum Backing {
    Mapped(Mmap),
    MappedMut(MmapMut),
    Stream(File),
}

/// The bytes of one open file.
///
/// Mapped sources hand out borrowed slices; stream sources seek and read
/// into owned buffers.
pub struct ByteSource {
    backing: Backing,
    len: u64,
    writable: bool,
}

impl ByteSource {
    /// Open `path` with the requested access mode.
    ///
    /// `AccessMode::Auto` tries a memory map first and falls back to
    /// stream reads when mapping fails.
    pub fn open(path: impl AsRef<Path>, access: AccessMode, writable: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(writable).open(path)?;
        let len = file.metadata()?.len();

        let backing = match access {
            AccessMode::Stream => Backing::Stream(file),
            AccessMode::Mapped => map(&file, writable)?,
            AccessMode::Auto => match map(&file, writable) {
                Ok(backing) => backing,
                Err(err) => {
                    warn!(path = %path.display(), %err, "memory map failed, using stream reads");
                    Backing::Stream(file)
                }
            },
        };

        let source = Self {
            backing,
            len,
            writable,
        };
        debug!(
            path = %path.display(),
            len,
            mapped = source.is_mapped(),
            writable,
            "byte source opened"
        );
        Ok(source)
    }

    /// File length in bytes at open time.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_mapped(&self) -> bool {
        !matches!(self.backing, Backing::Stream(_))
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    fn check_range(&self, offset: u64, len: usize) -> Result<()> {
        let end = offset + len as u64;
        if end > self.len {
            return Err(SegyError::TooShort {
                expected: end,
                actual: self.len,
            });
        }
        Ok(())
    }

    /// Read `len` bytes at `offset`. Borrowed when mapped.
    pub fn read_at(&self, offset: u64, len: usize) -> Result<Cow<'_, [u8]>> {
        self.check_range(offset, len)?;
        let start = offset as usize;
        match &self.backing {
            Backing::Mapped(map) => Ok(Cow::Borrowed(&map[start..start + len])),
            Backing::MappedMut(map) => Ok(Cow::Borrowed(&map[start..start + len])),
            Backing::Stream(file) => {
                let mut buf = vec![0u8; len];
                let mut file = file;
                file.seek(SeekFrom::Start(offset))?;
                file.read_exact(&mut buf)?;
                Ok(Cow::Owned(buf))
            }
        }
    }

    /// The whole mapped file.
    pub fn bytes(&self) -> Result<&[u8]> {
        match &self.backing {
            Backing::Mapped(map) => Ok(&map[..]),
            Backing::MappedMut(map) => Ok(&map[..]),
            Backing::Stream(_) => Err(SegyError::NotMapped),
        }
    }

    /// The whole mapped file, writable.
    pub fn bytes_mut(&mut self) -> Result<&mut [u8]> {
        match &mut self.backing {
            Backing::MappedMut(map) => Ok(&mut map[..]),
            Backing::Mapped(_) => Err(SegyError::ReadOnly),
            Backing::Stream(_) => Err(SegyError::NotMapped),
        }
    }

    /// Overwrite bytes at `offset`. The file length never changes.
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        if !self.writable {
            return Err(SegyError::ReadOnly);
        }
        self.check_range(offset, data.len())?;
        let start = offset as usize;
        match &mut self.backing {
            Backing::MappedMut(map) => map[start..start + data.len()].copy_from_slice(data),
            Backing::Mapped(_) => return Err(SegyError::ReadOnly),
            Backing::Stream(file) => {
                file.seek(SeekFrom::Start(offset))?;
                file.write_all(data)?;
            }
        }
        Ok(())
    }

    /// Push pending writes to disk.
    pub fn flush(&mut self) -> Result<()> {
        match &mut self.backing {
            Backing::MappedMut(map) => map.flush()?,
            Backing::Stream(file) if self.writable => file.flush()?,
            _ => {}
        }
        Ok(())
    }
}

fn map(file: &File, writable: bool) -> Result<Backing> {
    // SAFETY: the map is owned by the session and never outlives it. Other
    // processes truncating the file while it is mapped is outside what the
    // crate supports, as with any mmap-backed reader.
    let backing = if writable {
        Backing::MappedMut(unsafe { MmapMut::map_mut(file)? })
    } else {
        Backing::Mapped(unsafe { Mmap::map(file)? })
    };
    Ok(backing)
}
