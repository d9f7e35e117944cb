//! Error types for the virtual filesystem.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for virtual filesystem operations.
pub type VfsResult<T> = Result<T, VfsError>;

/// Errors that can occur while building or reading a virtual filesystem.
///
/// Construction errors (`DuplicateEntry`, `Corrupt`, `Io` while opening a shard)
/// abort the build. Errors returned by `stat`, `open` and `list_directory` on a
/// built filesystem concern a single entry and leave the instance usable.
#[derive(Debug, Error)]
pub enum VfsError {
    /// No entry exists at the requested path.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// The path names a directory where a file was expected.
    #[error("is a directory: {path}")]
    IsADirectory { path: String },

    /// The path names a file where a directory was expected.
    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    /// The same file path is present in two shards.
    #[error("duplicate entry {path} in {first} and {second}")]
    DuplicateEntry {
        path: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Malformed archive structure or an unsupported feature.
    #[error("corrupt archive {}: {reason}", shard.display())]
    Corrupt { shard: PathBuf, reason: String },

    /// The filesystem has been closed.
    #[error("filesystem is closed")]
    Closed,

    /// Host I/O failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A shard pattern matched no files.
    #[error("no archive shards match {pattern}")]
    NoShards { pattern: String },

    /// A shard pattern could not be parsed.
    #[error("invalid shard pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// The inputs are neither a directory nor a set of ZIP shards.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// A walk was interrupted by its cancellation token.
    #[error("operation cancelled")]
    Cancelled,
}

impl VfsError {
    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub(crate) fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory { path: path.into() }
    }

    pub(crate) fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory { path: path.into() }
    }

    pub(crate) fn corrupt(shard: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            shard: shard.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this error reports a missing entry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
