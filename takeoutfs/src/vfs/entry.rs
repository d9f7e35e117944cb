//! Entry model shared by every filesystem backend.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::path::base_name;

/// Kind of an addressable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file with byte content.
    File,
    /// Directory, stored or synthesized from deeper entries.
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "directory"),
        }
    }
}

/// Opaque handle that lets the owning backend reopen an entry's content.
///
/// The locator never holds a stream or a file handle. It is only meaningful to
/// the filesystem that produced it; any other backend falls back to a path lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLocator(pub(crate) Locator);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Locator {
    /// Directories and roots have no content.
    None,
    /// File on the host filesystem.
    Host(PathBuf),
    /// Slot in a merged archive index.
    Archive { slot: usize },
}

impl ContentLocator {
    pub(crate) fn none() -> Self {
        Self(Locator::None)
    }

    pub(crate) fn host(path: impl Into<PathBuf>) -> Self {
        Self(Locator::Host(path.into()))
    }

    pub(crate) fn archive(slot: usize) -> Self {
        Self(Locator::Archive { slot })
    }
}

/// One addressable item of a virtual filesystem.
///
/// Paths are relative to the filesystem root, slash separated, case sensitive
/// and never start with a separator. The root itself has the empty path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    path: String,
    kind: EntryKind,
    size: u64,
    modified: Option<DateTime<Utc>>,
    locator: ContentLocator,
}

impl Entry {
    /// Create a file entry.
    pub(crate) fn file(
        path: impl Into<String>,
        size: u64,
        modified: Option<DateTime<Utc>>,
        locator: ContentLocator,
    ) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size,
            modified,
            locator,
        }
    }

    /// Create a directory entry. Directories report a size of zero.
    pub(crate) fn directory(path: impl Into<String>, modified: Option<DateTime<Utc>>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            size: 0,
            modified,
            locator: ContentLocator::none(),
        }
    }

    /// Full path relative to the filesystem root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Local name (last path segment). Empty for the root.
    pub fn name(&self) -> &str {
        base_name(&self.path)
    }

    /// Local name with a trailing `/` for directories, as shown in listings.
    pub fn display_name(&self) -> String {
        match self.kind {
            EntryKind::Directory => format!("{}/", self.name()),
            EntryKind::File => self.name().to_string(),
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Uncompressed size in bytes (0 for directories).
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Modification time, when the backend knows it.
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    pub fn locator(&self) -> &ContentLocator {
        &self.locator
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {} bytes)", self.path, self.kind, self.size)
    }
}
