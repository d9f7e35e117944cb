//! Minimal ZIP writer for building test shards.
//!
//! Shared with the integration tests, so it only depends on `std` and `flate2`.

#![allow(dead_code)]

use std::io::{self, Write};
use std::path::Path;

use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATED: u16 = 8;
const FLAG_UTF8: u16 = 0x0800;

/// Builds a single-disk ZIP archive in memory.
pub struct ZipBuilder {
    data: Vec<u8>,
    central: Vec<u8>,
    count: u16,
    dos_date: u16,
    dos_time: u16,
}

impl Default for ZipBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            central: Vec::new(),
            count: 0,
            dos_date: dos_date(2024, 1, 2),
            dos_time: 10 << 11,
        }
    }

    /// Date stamped on every entry added after this call.
    pub fn dated(mut self, year: u16, month: u16, day: u16) -> Self {
        self.dos_date = dos_date(year, month, day);
        self
    }

    pub fn stored(self, name: &str, content: &[u8]) -> Self {
        let crc = crc32(content);
        self.raw_entry(name, METHOD_STORED, content.to_vec(), content.len(), crc)
    }

    pub fn deflated(self, name: &str, content: &[u8]) -> Self {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content).expect("in-memory write");
        let compressed = encoder.finish().expect("in-memory write");
        let crc = crc32(content);
        self.raw_entry(name, METHOD_DEFLATED, compressed, content.len(), crc)
    }

    /// Stored entry whose recorded checksum does not match its content.
    pub fn stored_with_bad_crc(self, name: &str, content: &[u8]) -> Self {
        let crc = crc32(content) ^ 0xFFFF_FFFF;
        self.raw_entry(name, METHOD_STORED, content.to_vec(), content.len(), crc)
    }

    /// Entry recorded with an arbitrary compression method.
    pub fn with_method(self, name: &str, method: u16, content: &[u8]) -> Self {
        let crc = crc32(content);
        self.raw_entry(name, method, content.to_vec(), content.len(), crc)
    }

    /// Explicit directory record; `name` should end with `/`.
    pub fn directory(self, name: &str) -> Self {
        self.raw_entry(name, METHOD_STORED, Vec::new(), 0, 0)
    }

    fn raw_entry(
        mut self,
        name: &str,
        method: u16,
        payload: Vec<u8>,
        uncompressed: usize,
        crc: u32,
    ) -> Self {
        let offset = self.data.len() as u32;
        let name_bytes = name.as_bytes();

        let local = &mut self.data;
        local.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        local.extend_from_slice(&20u16.to_le_bytes());
        local.extend_from_slice(&FLAG_UTF8.to_le_bytes());
        local.extend_from_slice(&method.to_le_bytes());
        local.extend_from_slice(&self.dos_time.to_le_bytes());
        local.extend_from_slice(&self.dos_date.to_le_bytes());
        local.extend_from_slice(&crc.to_le_bytes());
        local.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        local.extend_from_slice(&(uncompressed as u32).to_le_bytes());
        local.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
        local.extend_from_slice(&0u16.to_le_bytes());
        local.extend_from_slice(name_bytes);
        local.extend_from_slice(&payload);

        let central = &mut self.central;
        central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&FLAG_UTF8.to_le_bytes());
        central.extend_from_slice(&method.to_le_bytes());
        central.extend_from_slice(&self.dos_time.to_le_bytes());
        central.extend_from_slice(&self.dos_date.to_le_bytes());
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        central.extend_from_slice(&(uncompressed as u32).to_le_bytes());
        central.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u32.to_le_bytes());
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name_bytes);

        self.count += 1;
        self
    }

    /// Serialize the archive.
    pub fn finish(self) -> Vec<u8> {
        let mut out = self.data;
        let directory_offset = out.len() as u32;
        out.extend_from_slice(&self.central);

        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&self.count.to_le_bytes());
        out.extend_from_slice(&self.count.to_le_bytes());
        out.extend_from_slice(&(self.central.len() as u32).to_le_bytes());
        out.extend_from_slice(&directory_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    pub fn write_to(self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.finish())
    }
}

fn crc32(content: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(content);
    crc.sum()
}

fn dos_date(year: u16, month: u16, day: u16) -> u16 {
    ((year - 1980) << 9) | (month << 5) | day
}
