//! A single registered resource.

use std::fmt;
use std::io::{self, Write};

use chrono::{DateTime, Utc};

use crate::vfs::{ByteStream, Entry, FileSystem, VfsError, VfsResult};

/// Descriptive metadata of a resource.
///
/// Usually read from a sidecar file by the metadata collaborator; derived from
/// the entry itself when no sidecar exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMetadata {
    /// Original file name, which may differ from the entry name.
    pub filename: String,
    /// Creation time used for date-proximity lookups.
    pub created: Option<DateTime<Utc>>,
    pub size: u64,
    pub mime_type: Option<String>,
}

impl ResourceMetadata {
    /// Minimal metadata derived from an entry: local name, modification time
    /// as creation time, size, unknown MIME type.
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            filename: entry.name().to_string(),
            created: entry.modified(),
            size: entry.size(),
            mime_type: None,
        }
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = Some(created);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Handle onto one file of the bundle.
///
/// A resource never owns the filesystem. Content is streamed on demand by
/// passing the filesystem it was discovered in to [`Resource::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    container: String,
    parent: String,
    entry: Entry,
    metadata: ResourceMetadata,
}

impl Resource {
    pub(crate) fn new(
        container: impl Into<String>,
        parent: impl Into<String>,
        entry: Entry,
        metadata: Option<ResourceMetadata>,
    ) -> Self {
        let metadata = metadata.unwrap_or_else(|| ResourceMetadata::from_entry(&entry));
        Self {
            container: container.into(),
            parent: parent.into(),
            entry,
            metadata,
        }
    }

    /// Logical group (album or blog name).
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Path of the directory the resource was found in.
    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// Full path of the underlying entry.
    pub fn path(&self) -> &str {
        self.entry.path()
    }

    /// Base file name used for reference lookups.
    pub fn name(&self) -> &str {
        self.entry.name()
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.metadata.created
    }

    /// Open the resource content on the filesystem it was discovered in.
    pub fn open<'fs, F>(&self, fs: &'fs F) -> VfsResult<ByteStream<'fs>>
    where
        F: FileSystem + ?Sized,
    {
        fs.open_entry(&self.entry)
    }

    /// Stream the whole content into `writer`, returning the bytes copied.
    pub fn copy_to<F, W>(&self, fs: &F, writer: &mut W) -> VfsResult<u64>
    where
        F: FileSystem + ?Sized,
        W: Write + ?Sized,
    {
        let mut stream = self.open(fs)?;
        io::copy(&mut stream, writer).map_err(|e| VfsError::io(self.path(), e))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.path(), self.container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::DirectoryFs;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_metadata_derived_from_entry() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("photo.jpg"), b"12345").unwrap();
        let vfs = DirectoryFs::new(temp.path()).unwrap();
        let entry = vfs.stat("photo.jpg").unwrap();

        let resource = Resource::new("Trip", "", entry.clone(), None);

        assert_eq!(resource.metadata().filename, "photo.jpg");
        assert_eq!(resource.metadata().size, 5);
        assert_eq!(resource.created(), entry.modified());
        assert!(resource.metadata().mime_type.is_none());
    }

    #[test]
    fn test_explicit_metadata_wins() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("photo.jpg"), b"12345").unwrap();
        let vfs = DirectoryFs::new(temp.path()).unwrap();
        let entry = vfs.stat("photo.jpg").unwrap();
        let created = Utc.with_ymd_and_hms(2021, 6, 15, 12, 0, 0).unwrap();
        let metadata = ResourceMetadata::from_entry(&entry)
            .with_created(created)
            .with_mime_type("image/jpeg");

        let resource = Resource::new("Trip", "", entry, Some(metadata));

        assert_eq!(resource.created(), Some(created));
        assert_eq!(resource.metadata().mime_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn test_copy_to() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("Trip")).unwrap();
        std::fs::write(temp.path().join("Trip/photo.jpg"), b"jpeg bytes").unwrap();
        let vfs = DirectoryFs::new(temp.path()).unwrap();
        let resource = Resource::new("Trip", "Trip", vfs.stat("Trip/photo.jpg").unwrap(), None);

        let mut out = Vec::new();
        let copied = resource.copy_to(&vfs, &mut out).unwrap();

        assert_eq!(copied, 10);
        assert_eq!(out, b"jpeg bytes");
        assert_eq!(resource.to_string(), "Trip/photo.jpg [Trip]");
    }
}
