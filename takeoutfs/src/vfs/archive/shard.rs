//! One physical archive file of a possibly multi-part bundle.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::vfs::error::{VfsError, VfsResult};

/// An open archive shard.
///
/// The file handle is shared by every stream opened on the shard. Reads are
/// positioned: the lock is held for a single seek plus read and released
/// before any decompression happens.
#[derive(Debug)]
pub(crate) struct Shard {
    path: PathBuf,
    file: Mutex<File>,
    len: u64,
}

impl Shard {
    /// Open the shard at `path`.
    pub(crate) fn open(path: &Path) -> VfsResult<Self> {
        let file = File::open(path).map_err(|e| VfsError::io(path, e))?;
        let len = file
            .metadata()
            .map_err(|e| VfsError::io(path, e))?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            len,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the shard file in bytes.
    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    /// Read up to `buf.len()` bytes starting at `offset`.
    pub(crate) fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read(buf)
    }

    /// Fill `buf` with the bytes starting at `offset`.
    pub(crate) fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)
    }
}

/// Bounded reader over a byte range of a shard.
///
/// Each reader keeps its own position, so any number of them can be active on
/// the same shard at once.
pub(crate) struct ShardReader<'a> {
    shard: &'a Shard,
    pos: u64,
    end: u64,
}

impl<'a> ShardReader<'a> {
    pub(crate) fn new(shard: &'a Shard, offset: u64, len: u64) -> Self {
        Self {
            shard,
            pos: offset,
            end: offset.saturating_add(len),
        }
    }
}

impl Read for ShardReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.end || buf.is_empty() {
            return Ok(0);
        }

        let want = (self.end - self.pos).min(buf.len() as u64) as usize;
        let n = self.shard.read_at(self.pos, &mut buf[..want])?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("shard {} ended early", self.shard.path.display()),
            ));
        }
        self.pos += n as u64;
        Ok(n)
    }
}
