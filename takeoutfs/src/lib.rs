//! takeoutfs - Read-only access to exported data bundles
//!
//! An export bundle is a logical file tree delivered either as a plain
//! directory or split across several ZIP shards. This library presents both
//! as one randomly addressable, read-only tree and indexes the content files
//! found in it so that document converters can resolve file references.
//!
//! # Modules
//!
//! - [`vfs`]: the [`FileSystem`] capability with directory and merged
//!   archive backends
//! - [`resources`]: [`ResourceIndex`], multi-keyed lookup over discovered
//!   files
//! - [`scan`]: [`TakeoutScanner`], which walks a Blogger export and fills
//!   the index
//! - [`config`] and [`logging`]: ambient setup
//!
//! # Example
//!
//! ```ignore
//! use takeoutfs::{Bundle, ResourceIndex, TakeoutScanner, VfsConfig};
//!
//! let bundle = Bundle::open(&["takeout-*.zip"], &VfsConfig::default())?;
//! let mut index = ResourceIndex::new();
//! TakeoutScanner::new(&bundle).scan(&mut index)?;
//!
//! if let Some(photo) = index.search_by_base_and_date("IMG_0001.jpg", post_date) {
//!     photo.copy_to(&bundle, &mut output)?;
//! }
//! ```

pub mod config;
pub mod logging;
pub mod resources;
pub mod scan;
pub mod vfs;

pub use config::{ConfigError, VfsConfig};
pub use resources::{Resource, ResourceIndex, ResourceMetadata};
pub use scan::{MetadataSource, NoMetadata, ScanSummary, TakeoutScanner};
pub use vfs::{ArchiveFs, Bundle, DirectoryFs, Entry, EntryKind, FileSystem, VfsError, VfsResult};
