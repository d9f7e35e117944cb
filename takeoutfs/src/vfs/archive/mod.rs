//! Merged filesystem over one or more ZIP shards.
//!
//! Export services split large bundles into several archives that partition a
//! single logical tree (`takeout-001.zip`, `takeout-002.zip`, ...). This
//! module parses the central directory of every shard and merges the records
//! into one array sorted by full path. That array is the only index:
//!
//! - point lookups (`stat`, `open`) are a binary search,
//! - directory listings are a range scan from the lower bound of `dir/`,
//! - directories are synthesized from path prefixes and never stored.
//!
//! # Invariants
//!
//! - A path appears in at most one shard, directory records (`name/`)
//!   included. A collision aborts construction with
//!   [`VfsError::DuplicateEntry`]; no partial filesystem is ever returned.
//! - The index is sorted once and never mutated afterwards, so a built
//!   [`ArchiveFs`] can be read from any number of threads.

mod shard;
mod stream;
#[cfg(test)]
pub(crate) mod testing;
mod zip;

use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};

use self::shard::Shard;
use self::zip::ZipRecord;
use super::entry::{ContentLocator, Entry, Locator};
use super::error::{VfsError, VfsResult};
use super::path::normalize_path;
use super::{ByteStream, FileSystem};
use crate::config::VfsConfig;

pub use self::stream::EntryReader;

/// Merged index slot: one central directory record and the shard it lives in.
#[derive(Debug)]
struct IndexedRecord {
    shard: usize,
    record: ZipRecord,
}

/// Result of resolving a path against the sorted index.
enum Lookup {
    /// Exact match on a file record.
    File(usize),
    /// Path is a directory. Carries the slot of its explicit record, if any.
    Directory(Option<usize>),
    Missing,
}

/// Read-only filesystem over the union of several ZIP shards.
///
/// The filesystem owns every shard handle. Streams returned by
/// [`FileSystem::open`] borrow it, so it cannot be closed or dropped while a
/// stream is alive.
#[derive(Debug)]
pub struct ArchiveFs {
    shards: Vec<Shard>,
    records: Vec<IndexedRecord>,
    config: VfsConfig,
    closed: bool,
}

impl ArchiveFs {
    /// Build a filesystem from shard paths.
    ///
    /// A single path is treated as a glob pattern (a literal path is used as
    /// is when it names an existing file). Several paths are used verbatim.
    pub fn open<P: AsRef<Path>>(paths: &[P], config: &VfsConfig) -> VfsResult<Self> {
        let paths: Vec<PathBuf> = match paths {
            [] => {
                return Err(VfsError::NoShards {
                    pattern: String::new(),
                })
            }
            [single] => expand_shard_pattern(single.as_ref())?,
            many => many.iter().map(|p| p.as_ref().to_path_buf()).collect(),
        };
        Self::from_shards(&paths, config)
    }

    /// Build a filesystem from every file matching `pattern`.
    pub fn open_glob(pattern: &str, config: &VfsConfig) -> VfsResult<Self> {
        let paths = expand_shard_pattern(Path::new(pattern))?;
        Self::from_shards(&paths, config)
    }

    fn from_shards(paths: &[PathBuf], config: &VfsConfig) -> VfsResult<Self> {
        let parse = |path: &PathBuf| -> VfsResult<(Shard, Vec<ZipRecord>)> {
            let shard = Shard::open(path)?;
            let records = zip::read_central_directory(&shard)?;
            debug!(
                shard = %path.display(),
                entries = records.len(),
                bytes = shard.len(),
                "Parsed archive shard"
            );
            Ok((shard, records))
        };

        let parsed: Vec<(Shard, Vec<ZipRecord>)> = if config.parallel_scan && paths.len() > 1 {
            paths.par_iter().map(parse).collect::<VfsResult<_>>()?
        } else {
            paths.iter().map(parse).collect::<VfsResult<_>>()?
        };

        let (shards, records) = merge_shards(parsed)?;
        info!(
            shards = shards.len(),
            entries = records.len(),
            "Archive filesystem ready"
        );

        Ok(Self {
            shards,
            records,
            config: config.clone(),
            closed: false,
        })
    }

    /// Number of records in the merged index (files and explicit directories).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Paths of the shards backing this filesystem, in construction order.
    pub fn shard_paths(&self) -> impl Iterator<Item = &Path> {
        self.shards.iter().map(|s| s.path())
    }

    /// Iterate over every file entry in path order.
    pub fn files(&self) -> impl Iterator<Item = Entry> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.record.is_dir())
            .map(|(slot, _)| self.entry_at(slot))
    }

    /// Release every shard handle.
    ///
    /// Any later operation fails with [`VfsError::Closed`]. Closing twice is
    /// a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.records = Vec::new();
        let released = std::mem::take(&mut self.shards);
        debug!(shards = released.len(), "Archive filesystem closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Open the entry at `path` as a concrete [`EntryReader`].
    pub fn open_reader(&self, path: &str) -> VfsResult<EntryReader<'_>> {
        self.ensure_open()?;
        let path = normalize_path(path);
        match self.lookup(path) {
            Lookup::File(slot) => self.reader_at(slot),
            Lookup::Directory(_) => Err(VfsError::is_a_directory(path)),
            Lookup::Missing => Err(VfsError::not_found(path)),
        }
    }

    fn ensure_open(&self) -> VfsResult<()> {
        if self.closed {
            Err(VfsError::Closed)
        } else {
            Ok(())
        }
    }

    fn lower_bound(&self, key: &str) -> usize {
        self.records
            .partition_point(|r| r.record.name.as_str() < key)
    }

    fn lookup(&self, path: &str) -> Lookup {
        if path.is_empty() {
            return Lookup::Directory(None);
        }

        if let Ok(slot) = self
            .records
            .binary_search_by(|r| r.record.name.as_str().cmp(path))
        {
            return Lookup::File(slot);
        }

        let prefix = format!("{}/", path);
        let slot = self.lower_bound(&prefix);
        match self.records.get(slot) {
            Some(r) if r.record.name.starts_with(&prefix) => {
                Lookup::Directory((r.record.name == prefix).then_some(slot))
            }
            _ => Lookup::Missing,
        }
    }

    fn entry_at(&self, slot: usize) -> Entry {
        let record = &self.records[slot].record;
        Entry::file(
            record.name.as_str(),
            record.uncompressed_size,
            record.modified,
            ContentLocator::archive(slot),
        )
    }

    fn reader_at(&self, slot: usize) -> VfsResult<EntryReader<'_>> {
        let indexed = &self.records[slot];
        let shard = &self.shards[indexed.shard];
        let offset = zip::data_offset(shard, &indexed.record)?;
        Ok(EntryReader::new(
            shard,
            &indexed.record,
            offset,
            self.config.read_buffer_size,
            self.config.verify_checksums,
        ))
    }
}

impl FileSystem for ArchiveFs {
    fn stat(&self, path: &str) -> VfsResult<Entry> {
        self.ensure_open()?;
        let path = normalize_path(path);
        match self.lookup(path) {
            Lookup::File(slot) => Ok(self.entry_at(slot)),
            Lookup::Directory(marker) => Ok(Entry::directory(
                path,
                marker.and_then(|slot| self.records[slot].record.modified),
            )),
            Lookup::Missing => Err(VfsError::not_found(path)),
        }
    }

    fn open(&self, path: &str) -> VfsResult<ByteStream<'_>> {
        Ok(Box::new(self.open_reader(path)?))
    }

    fn list_directory(&self, path: &str) -> VfsResult<Vec<Entry>> {
        self.ensure_open()?;
        let path = normalize_path(path);
        let prefix = match self.lookup(path) {
            Lookup::Directory(_) if path.is_empty() => String::new(),
            Lookup::Directory(_) => format!("{}/", path),
            Lookup::File(_) => return Err(VfsError::not_a_directory(path)),
            Lookup::Missing => return Err(VfsError::not_found(path)),
        };

        let start = self.lower_bound(&prefix);
        let mut children: Vec<Entry> = Vec::new();
        for (slot, indexed) in self.records.iter().enumerate().skip(start) {
            // Sorted order keeps everything under the prefix contiguous.
            let Some(rest) = indexed.record.name.strip_prefix(prefix.as_str()) else {
                break;
            };
            if rest.is_empty() {
                // Explicit record of the listed directory itself.
                continue;
            }

            match rest.find('/') {
                Some(end) => {
                    let name = &rest[..end];
                    if children
                        .last()
                        .is_some_and(|last| last.is_dir() && last.name() == name)
                    {
                        continue;
                    }
                    let modified = if end + 1 == rest.len() {
                        indexed.record.modified
                    } else {
                        None
                    };
                    children.push(Entry::directory(format!("{}{}", prefix, name), modified));
                }
                None => children.push(self.entry_at(slot)),
            }
        }

        // '/' sorts after '-' and '.', so "b.txt" can precede the "b/" block.
        children.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(children)
    }

    fn open_entry(&self, entry: &Entry) -> VfsResult<ByteStream<'_>> {
        self.ensure_open()?;
        if let Locator::Archive { slot } = &entry.locator().0 {
            let slot = *slot;
            let same_record = self
                .records
                .get(slot)
                .is_some_and(|r| r.record.name == entry.path());
            if same_record {
                return Ok(Box::new(self.reader_at(slot)?));
            }
        }
        self.open(entry.path())
    }
}

/// Resolve the single-path form of [`ArchiveFs::open`] into shard paths.
fn expand_shard_pattern(pattern: &Path) -> VfsResult<Vec<PathBuf>> {
    if pattern.is_file() {
        return Ok(vec![pattern.to_path_buf()]);
    }

    let pattern_str = pattern.to_string_lossy();
    let mut paths = Vec::new();
    for matched in glob::glob(&pattern_str)? {
        let path = matched.map_err(|e| {
            let path = e.path().to_path_buf();
            VfsError::io(path, io::Error::from(e))
        })?;
        paths.push(path);
    }

    if paths.is_empty() {
        return Err(VfsError::NoShards {
            pattern: pattern_str.into_owned(),
        });
    }
    paths.sort();
    Ok(paths)
}

/// Union the records of every shard into one sorted, validated index.
fn merge_shards(
    parsed: Vec<(Shard, Vec<ZipRecord>)>,
) -> VfsResult<(Vec<Shard>, Vec<IndexedRecord>)> {
    let total = parsed.iter().map(|(_, records)| records.len()).sum();
    let mut shards = Vec::with_capacity(parsed.len());
    let mut unsorted = Vec::with_capacity(total);
    for (index, (shard, records)) in parsed.into_iter().enumerate() {
        unsorted.extend(
            records
                .into_iter()
                .map(|record| IndexedRecord { shard: index, record }),
        );
        shards.push(shard);
    }

    // Stable sort: equal names stay in shard order, so "first" below is the
    // earlier shard.
    unsorted.sort_by(|a, b| a.record.name.cmp(&b.record.name));

    let mut records: Vec<IndexedRecord> = Vec::with_capacity(unsorted.len());
    for indexed in unsorted {
        if let Some(previous) = records.last() {
            if previous.record.name == indexed.record.name {
                return Err(VfsError::DuplicateEntry {
                    path: indexed.record.name.clone(),
                    first: shards[previous.shard].path().to_path_buf(),
                    second: shards[indexed.shard].path().to_path_buf(),
                });
            }
        }
        records.push(indexed);
    }

    Ok((shards, records))
}
