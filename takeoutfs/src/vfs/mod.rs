//! Read-only virtual filesystem over export bundles.
//!
//! An export bundle is either a plain host directory or a set of ZIP shards
//! that partition one logical tree. Both are exposed through the
//! [`FileSystem`] capability so that scanning and rendering code never needs
//! to know which backend it talks to.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   Bundle                     │
//! │   (selected once from input classification)  │
//! └───────────────┬──────────────────────┬───────┘
//!                 │                      │
//!                 ▼                      ▼
//! ┌──────────────────────────┐ ┌─────────────────────────────┐
//! │       DirectoryFs        │ │         ArchiveFs           │
//! │  root.join(path) → host  │ │  shards: [001.zip, 002.zip] │
//! │                          │ │  entries: sorted by path    │
//! └──────────────────────────┘ └─────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use takeoutfs::vfs::{Bundle, FileSystem};
//! use takeoutfs::VfsConfig;
//!
//! let bundle = Bundle::open(&["takeout-*.zip"], &VfsConfig::default())?;
//! for child in bundle.list_directory("Takeout")? {
//!     println!("{}", child.display_name());
//! }
//! ```

mod archive;
mod bundle;
mod directory;
mod entry;
mod error;
mod path;
mod walk;

use std::io::Read;

pub use archive::{ArchiveFs, EntryReader};
pub use bundle::Bundle;
pub use directory::DirectoryFs;
pub use entry::{ContentLocator, Entry, EntryKind};
pub use error::{VfsError, VfsResult};
pub use path::{base_name, join_path, normalize_path, parent_path};
pub use walk::{walk, WalkControl};

/// Byte stream returned by [`FileSystem::open`].
///
/// Streams borrow the filesystem that produced them and cannot outlive it.
pub type ByteStream<'a> = Box<dyn Read + Send + 'a>;

/// Read-only filesystem capability.
///
/// Paths are relative and slash separated; `""` and `"."` denote the root.
/// Implementations are shared between threads once built, so every method
/// takes `&self`.
pub trait FileSystem: Send + Sync {
    /// Describe the entry at `path`.
    fn stat(&self, path: &str) -> VfsResult<Entry>;

    /// Open the file at `path` for reading.
    ///
    /// Every call returns an independent stream with its own read cursor.
    fn open(&self, path: &str) -> VfsResult<ByteStream<'_>>;

    /// List the immediate children of the directory at `path`, ordered by
    /// local name.
    fn list_directory(&self, path: &str) -> VfsResult<Vec<Entry>>;

    /// Open a previously returned entry.
    ///
    /// Backends may use the entry's [`ContentLocator`] to skip the lookup.
    fn open_entry(&self, entry: &Entry) -> VfsResult<ByteStream<'_>> {
        self.open(entry.path())
    }
}
