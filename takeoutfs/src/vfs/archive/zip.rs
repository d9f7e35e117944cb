//! ZIP central directory parsing.
//!
//! Only what is needed to serve reads is decoded: names, sizes, offsets,
//! compression method, CRC-32 and modification time. ZIP64 records are
//! honoured; spanned archives and encrypted entries are rejected.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::shard::Shard;
use crate::vfs::error::{VfsError, VfsResult};

const EOCD_SIGNATURE: u32 = 0x0605_4b50;
const EOCD_LEN: usize = 22;
const ZIP64_LOCATOR_SIGNATURE: u32 = 0x0706_4b50;
const ZIP64_LOCATOR_LEN: usize = 20;
const ZIP64_EOCD_SIGNATURE: u32 = 0x0606_4b50;
const ZIP64_EOCD_LEN: usize = 56;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x0201_4b50;
const CENTRAL_HEADER_LEN: usize = 46;
const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const LOCAL_HEADER_LEN: usize = 30;
const MAX_COMMENT_LEN: usize = 0xFFFF;

const EXTRA_ZIP64: u16 = 0x0001;
const EXTRA_EXTENDED_TIMESTAMP: u16 = 0x5455;

const FLAG_ENCRYPTED: u16 = 0x0001;

/// Compression method of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompressionMethod {
    Stored,
    Deflated,
}

impl CompressionMethod {
    fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Stored),
            8 => Some(Self::Deflated),
            _ => None,
        }
    }
}

/// One central directory record.
#[derive(Debug, Clone)]
pub(crate) struct ZipRecord {
    /// Entry name without a leading separator. Directory records keep their
    /// trailing `/`.
    pub name: String,
    pub method: CompressionMethod,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub header_offset: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl ZipRecord {
    pub(crate) fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// Little-endian field reader over a byte slice.
struct Fields<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Fields<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn skip(&mut self, n: usize) -> Option<()> {
        self.bytes(n).map(|_| ())
    }

    fn u8(&mut self) -> Option<u8> {
        self.bytes(1).map(|b| b[0])
    }

    fn u16(&mut self) -> Option<u16> {
        self.bytes(2).map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Option<u32> {
        self.bytes(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Option<u64> {
        self.bytes(8).map(|b| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(b);
            u64::from_le_bytes(raw)
        })
    }
}

/// Location of the central directory inside a shard.
#[derive(Debug, PartialEq, Eq)]
struct DirectoryEnd {
    entries: u64,
    size: u64,
    offset: u64,
}

/// Parse every central directory record of `shard`.
pub(crate) fn read_central_directory(shard: &Shard) -> VfsResult<Vec<ZipRecord>> {
    let end = find_directory_end(shard)?;
    if end.offset.saturating_add(end.size) > shard.len() {
        return Err(VfsError::corrupt(
            shard.path(),
            "central directory extends past end of file",
        ));
    }

    let mut raw = vec![0u8; end.size as usize];
    shard
        .read_exact_at(end.offset, &mut raw)
        .map_err(|e| VfsError::io(shard.path(), e))?;

    let mut fields = Fields::new(&raw);
    let mut records = Vec::with_capacity(end.entries.min(1 << 20) as usize);
    for _ in 0..end.entries {
        let record = parse_central_header(&mut fields)
            .map_err(|reason| VfsError::corrupt(shard.path(), reason))?;
        records.push(record);
    }

    Ok(records)
}

/// Offset of the first data byte of `record`, read from its local header.
pub(crate) fn data_offset(shard: &Shard, record: &ZipRecord) -> VfsResult<u64> {
    let mut header = [0u8; LOCAL_HEADER_LEN];
    shard
        .read_exact_at(record.header_offset, &mut header)
        .map_err(|e| VfsError::io(shard.path(), e))?;

    let mut fields = Fields::new(&header);
    if fields.u32() != Some(LOCAL_HEADER_SIGNATURE) {
        return Err(VfsError::corrupt(
            shard.path(),
            format!("{}: bad local header signature", record.name),
        ));
    }
    fields.skip(22);
    let name_len = fields.u16().unwrap_or(0) as u64;
    let extra_len = fields.u16().unwrap_or(0) as u64;

    let offset = record.header_offset + LOCAL_HEADER_LEN as u64 + name_len + extra_len;
    if offset.saturating_add(record.compressed_size) > shard.len() {
        return Err(VfsError::corrupt(
            shard.path(),
            format!("{}: entry data extends past end of file", record.name),
        ));
    }
    Ok(offset)
}

fn find_directory_end(shard: &Shard) -> VfsResult<DirectoryEnd> {
    let len = shard.len();
    if len < EOCD_LEN as u64 {
        return Err(VfsError::corrupt(shard.path(), "file too small to be a zip archive"));
    }

    let search_len = len.min((EOCD_LEN + MAX_COMMENT_LEN) as u64) as usize;
    let search_start = len - search_len as u64;
    let mut tail = vec![0u8; search_len];
    shard
        .read_exact_at(search_start, &mut tail)
        .map_err(|e| VfsError::io(shard.path(), e))?;

    let eocd_pos = locate_eocd(&tail)
        .ok_or_else(|| VfsError::corrupt(shard.path(), "end of central directory not found"))?;

    let mut fields = Fields::new(&tail[eocd_pos..]);
    fields.skip(4);
    let disk = fields.u16().unwrap_or(0) as u32;
    let directory_disk = fields.u16().unwrap_or(0) as u32;
    fields.skip(2);
    let entries = fields.u16().unwrap_or(0) as u64;
    let size = fields.u32().unwrap_or(0) as u64;
    let offset = fields.u32().unwrap_or(0) as u64;

    let mut end = DirectoryEnd {
        entries,
        size,
        offset,
    };
    let mut disks = (disk, directory_disk);

    let eocd_abs = search_start + eocd_pos as u64;
    if let Some((zip64_end, zip64_disks)) = read_zip64_end(shard, eocd_abs)? {
        end = zip64_end;
        disks = zip64_disks;
    }

    if disks != (0, 0) {
        return Err(VfsError::corrupt(
            shard.path(),
            "spanned archives are not supported",
        ));
    }
    Ok(end)
}

fn locate_eocd(tail: &[u8]) -> Option<usize> {
    if tail.len() < EOCD_LEN {
        return None;
    }
    (0..=tail.len() - EOCD_LEN).rev().find(|&i| {
        let mut fields = Fields::new(&tail[i..]);
        if fields.u32() != Some(EOCD_SIGNATURE) {
            return false;
        }
        fields.skip(16);
        let comment_len = fields.u16().unwrap_or(0) as usize;
        i + EOCD_LEN + comment_len <= tail.len()
    })
}

fn read_zip64_end(shard: &Shard, eocd_abs: u64) -> VfsResult<Option<(DirectoryEnd, (u32, u32))>> {
    if eocd_abs < ZIP64_LOCATOR_LEN as u64 {
        return Ok(None);
    }

    let mut locator = [0u8; ZIP64_LOCATOR_LEN];
    shard
        .read_exact_at(eocd_abs - ZIP64_LOCATOR_LEN as u64, &mut locator)
        .map_err(|e| VfsError::io(shard.path(), e))?;
    let mut fields = Fields::new(&locator);
    if fields.u32() != Some(ZIP64_LOCATOR_SIGNATURE) {
        return Ok(None);
    }
    fields.skip(4);
    let record_offset = fields.u64().unwrap_or(0);
    if record_offset.saturating_add(ZIP64_EOCD_LEN as u64) > shard.len() {
        return Err(VfsError::corrupt(shard.path(), "zip64 end record out of bounds"));
    }

    let mut record = [0u8; ZIP64_EOCD_LEN];
    shard
        .read_exact_at(record_offset, &mut record)
        .map_err(|e| VfsError::io(shard.path(), e))?;
    let mut fields = Fields::new(&record);
    if fields.u32() != Some(ZIP64_EOCD_SIGNATURE) {
        return Err(VfsError::corrupt(shard.path(), "bad zip64 end record signature"));
    }
    fields.skip(12);
    let disk = fields.u32().unwrap_or(0);
    let directory_disk = fields.u32().unwrap_or(0);
    fields.skip(8);
    let entries = fields.u64().unwrap_or(0);
    let size = fields.u64().unwrap_or(0);
    let offset = fields.u64().unwrap_or(0);

    Ok(Some((
        DirectoryEnd {
            entries,
            size,
            offset,
        },
        (disk, directory_disk),
    )))
}

fn parse_central_header(fields: &mut Fields<'_>) -> Result<ZipRecord, String> {
    let truncated = || "truncated central directory".to_string();

    if fields.remaining() < CENTRAL_HEADER_LEN {
        return Err(truncated());
    }
    if fields.u32() != Some(CENTRAL_HEADER_SIGNATURE) {
        return Err("bad central directory header signature".to_string());
    }
    fields.skip(4).ok_or_else(truncated)?;
    let flags = fields.u16().ok_or_else(truncated)?;
    let method_code = fields.u16().ok_or_else(truncated)?;
    let dos_time = fields.u16().ok_or_else(truncated)?;
    let dos_date = fields.u16().ok_or_else(truncated)?;
    let crc32 = fields.u32().ok_or_else(truncated)?;
    let mut compressed_size = fields.u32().ok_or_else(truncated)? as u64;
    let mut uncompressed_size = fields.u32().ok_or_else(truncated)? as u64;
    let name_len = fields.u16().ok_or_else(truncated)? as usize;
    let extra_len = fields.u16().ok_or_else(truncated)? as usize;
    let comment_len = fields.u16().ok_or_else(truncated)? as usize;
    fields.skip(8).ok_or_else(truncated)?;
    let mut header_offset = fields.u32().ok_or_else(truncated)? as u64;

    let raw_name = fields.bytes(name_len).ok_or_else(truncated)?;
    let extra = fields.bytes(extra_len).ok_or_else(truncated)?;
    fields.skip(comment_len).ok_or_else(truncated)?;

    let name = normalize_entry_name(&String::from_utf8_lossy(raw_name));
    if name.is_empty() {
        return Err("entry with empty name".to_string());
    }
    if flags & FLAG_ENCRYPTED != 0 {
        return Err(format!("{}: encrypted entries are not supported", name));
    }
    let method = CompressionMethod::from_code(method_code)
        .ok_or_else(|| format!("{}: unsupported compression method {}", name, method_code))?;

    let mut modified = dos_datetime(dos_date, dos_time);

    let mut extras = Fields::new(extra);
    while extras.remaining() >= 4 {
        let id = extras.u16().ok_or_else(truncated)?;
        let size = extras.u16().ok_or_else(truncated)? as usize;
        let Some(data) = extras.bytes(size) else {
            break;
        };
        let mut data = Fields::new(data);
        match id {
            EXTRA_ZIP64 => {
                if uncompressed_size == u32::MAX as u64 {
                    uncompressed_size = data.u64().ok_or_else(truncated)?;
                }
                if compressed_size == u32::MAX as u64 {
                    compressed_size = data.u64().ok_or_else(truncated)?;
                }
                if header_offset == u32::MAX as u64 {
                    header_offset = data.u64().ok_or_else(truncated)?;
                }
            }
            EXTRA_EXTENDED_TIMESTAMP => {
                if data.u8().is_some_and(|flags| flags & 0x01 != 0) {
                    if let Some(seconds) = data.u32() {
                        modified = Utc.timestamp_opt(seconds as i32 as i64, 0).single();
                    }
                }
            }
            _ => {}
        }
    }

    Ok(ZipRecord {
        name,
        method,
        crc32,
        compressed_size,
        uncompressed_size,
        header_offset,
        modified,
    })
}

/// Collapse empty and `.` segments (`/a//./b` becomes `a/b`). Directory
/// records keep their trailing `/`.
fn normalize_entry_name(raw: &str) -> String {
    let mut name = raw
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");
    if raw.ends_with('/') && !name.is_empty() {
        name.push('/');
    }
    name
}

/// Decode an MS-DOS date and time, taken as UTC.
pub(crate) fn dos_datetime(date: u16, time: u16) -> Option<DateTime<Utc>> {
    let year = 1980 + (date >> 9) as i32;
    let month = ((date >> 5) & 0x0F) as u32;
    let day = (date & 0x1F) as u32;
    let hour = (time >> 11) as u32;
    let minute = ((time >> 5) & 0x3F) as u32;
    let second = ((time & 0x1F) * 2) as u32;

    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(hour, minute, second)
        .map(|naive| naive.and_utc())
}
