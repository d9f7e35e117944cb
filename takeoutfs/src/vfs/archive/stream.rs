//! Lazily decompressing entry streams.

use std::io::{self, BufReader, Read};

use flate2::bufread::DeflateDecoder;
use flate2::Crc;

use super::shard::{Shard, ShardReader};
use super::zip::{CompressionMethod, ZipRecord};

enum Decoder<'a> {
    Stored(BufReader<ShardReader<'a>>),
    Deflated(DeflateDecoder<BufReader<ShardReader<'a>>>),
}

/// Byte stream over one archive entry.
///
/// Each reader owns its cursor and inflate state and only borrows the shard,
/// so readers of the same or different entries never interfere. When
/// checksum verification is enabled, the CRC-32 and length are checked once
/// the underlying data is exhausted and a mismatch surfaces as an
/// [`io::ErrorKind::InvalidData`] error from `read`.
pub struct EntryReader<'a> {
    name: String,
    decoder: Decoder<'a>,
    crc: Crc,
    expected_crc: u32,
    expected_size: u64,
    produced: u64,
    verify: bool,
}

impl<'a> EntryReader<'a> {
    pub(crate) fn new(
        shard: &'a Shard,
        record: &ZipRecord,
        data_offset: u64,
        buffer_size: usize,
        verify: bool,
    ) -> Self {
        let raw = BufReader::with_capacity(
            buffer_size.max(1),
            ShardReader::new(shard, data_offset, record.compressed_size),
        );
        let decoder = match record.method {
            CompressionMethod::Stored => Decoder::Stored(raw),
            CompressionMethod::Deflated => Decoder::Deflated(DeflateDecoder::new(raw)),
        };

        Self {
            name: record.name.clone(),
            decoder,
            crc: Crc::new(),
            expected_crc: record.crc32,
            expected_size: record.uncompressed_size,
            produced: 0,
            verify,
        }
    }

    /// Uncompressed size announced by the archive.
    pub fn len(&self) -> u64 {
        self.expected_size
    }

    pub fn is_empty(&self) -> bool {
        self.expected_size == 0
    }

    fn finish(&self) -> io::Result<()> {
        if self.produced != self.expected_size {
            return Err(invalid_data(format!(
                "{}: expected {} bytes, got {}",
                self.name, self.expected_size, self.produced
            )));
        }
        if self.verify && self.crc.sum() != self.expected_crc {
            return Err(invalid_data(format!(
                "{}: checksum mismatch (expected {:08x}, got {:08x})",
                self.name,
                self.expected_crc,
                self.crc.sum()
            )));
        }
        Ok(())
    }
}

impl Read for EntryReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let n = match &mut self.decoder {
            Decoder::Stored(reader) => reader.read(buf)?,
            Decoder::Deflated(reader) => reader.read(buf)?,
        };
        if n == 0 {
            self.finish()?;
            return Ok(0);
        }

        self.produced += n as u64;
        if self.produced > self.expected_size {
            return Err(invalid_data(format!(
                "{}: entry is longer than its declared {} bytes",
                self.name, self.expected_size
            )));
        }
        if self.verify {
            self.crc.update(&buf[..n]);
        }
        Ok(n)
    }
}

impl std::fmt::Debug for EntryReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryReader")
            .field("name", &self.name)
            .field("produced", &self.produced)
            .field("expected_size", &self.expected_size)
            .finish()
    }
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}
