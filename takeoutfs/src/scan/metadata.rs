//! Interface to sidecar metadata parsers.

use crate::resources::ResourceMetadata;
use crate::vfs::{Entry, FileSystem, VfsResult};

/// Reads the sidecar metadata of a resource.
///
/// `sidecar` is the path of the `.json` file next to `entry`; the scanner only
/// calls this when that file exists. Returning `Ok(None)` falls back to
/// metadata derived from the entry.
pub trait MetadataSource: Send + Sync {
    fn load(
        &self,
        fs: &dyn FileSystem,
        entry: &Entry,
        sidecar: &str,
    ) -> VfsResult<Option<ResourceMetadata>>;
}

/// Source that never reads sidecars.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl MetadataSource for NoMetadata {
    fn load(
        &self,
        _fs: &dyn FileSystem,
        _entry: &Entry,
        _sidecar: &str,
    ) -> VfsResult<Option<ResourceMetadata>> {
        Ok(None)
    }
}
