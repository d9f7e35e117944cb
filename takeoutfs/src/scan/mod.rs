//! Discovery of Blogger resources in an export bundle.
//!
//! The scanner walks the bundle through the [`FileSystem`] capability and
//! registers content files in a [`ResourceIndex`]:
//!
//! ```text
//! Takeout/Blogger/
//!   Albums/<album>/IMG_0001.jpg        → resource, container = <album>
//!   Albums/<album>/IMG_0001.jpg.json   → sidecar metadata (not registered)
//!   Blogs/<blog>/settings.csv          → blog settings (not registered)
//!   Blogs/<blog>/feed.atom             → posts (not registered)
//!   Blogs/<blog>/banner.png            → resource, container = <blog>
//! ```
//!
//! Sidecar parsing is delegated to a [`MetadataSource`].

mod metadata;

use std::fmt;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::resources::{ResourceIndex, ResourceMetadata};
use crate::vfs::{join_path, walk, Entry, FileSystem, VfsError, VfsResult, WalkControl};

pub use metadata::{MetadataSource, NoMetadata};

/// Directory that marks a Blogger export.
pub const BLOGGER_DIR: &str = "Blogger";
/// Album section below [`BLOGGER_DIR`].
pub const ALBUMS_DIR: &str = "Albums";
/// Blog section below [`BLOGGER_DIR`].
pub const BLOGS_DIR: &str = "Blogs";
/// Per-blog settings file, consumed by the settings parser.
pub const SETTINGS_FILE: &str = "settings.csv";
/// Per-blog post feed, consumed by the feed parser.
pub const FEED_FILE: &str = "feed.atom";
/// Extension of sidecar metadata files.
pub const SIDECAR_EXTENSION: &str = ".json";

/// Counts reported by [`TakeoutScanner::scan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub albums: usize,
    pub blogs: usize,
    pub resources: usize,
    /// Containers or files left out because of read errors.
    pub skipped: usize,
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} albums, {} blogs, {} resources ({} skipped)",
            self.albums, self.blogs, self.resources, self.skipped
        )
    }
}

/// Which section a container directory belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Album,
    Blog,
}

impl Section {
    /// Whether a file in this section's containers is a resource.
    fn is_resource(self, name: &str) -> bool {
        if is_sidecar(name) {
            return false;
        }
        match self {
            Section::Album => true,
            Section::Blog => name != SETTINGS_FILE && name != FEED_FILE,
        }
    }
}

/// Whether `name` is a sidecar metadata file, matching the extension in any case.
fn is_sidecar(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(&SIDECAR_EXTENSION[1..]))
}

/// Walks a bundle and fills a [`ResourceIndex`].
pub struct TakeoutScanner<'a, F: FileSystem> {
    fs: &'a F,
    metadata: Box<dyn MetadataSource + 'a>,
    cancel: CancellationToken,
}

impl<'a, F: FileSystem> TakeoutScanner<'a, F> {
    /// Scanner without sidecar metadata and with a fresh cancellation token.
    pub fn new(fs: &'a F) -> Self {
        Self {
            fs,
            metadata: Box::new(NoMetadata),
            cancel: CancellationToken::new(),
        }
    }

    /// Use `source` to read sidecar metadata of album files.
    pub fn with_metadata(mut self, source: impl MetadataSource + 'a) -> Self {
        self.metadata = Box::new(source);
        self
    }

    /// Stop scanning once `cancel` is triggered.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Scan the whole bundle into `index`.
    ///
    /// Unreadable containers and files are logged and counted as skipped.
    /// Cancellation aborts with [`VfsError::Cancelled`]; resources registered
    /// before that stay in the index.
    pub fn scan(&self, index: &mut ResourceIndex) -> VfsResult<ScanSummary> {
        let mut summary = ScanSummary::default();

        walk(self.fs, "", &self.cancel, |entry| {
            if !entry.is_dir() {
                return Ok(WalkControl::Continue);
            }
            if entry.name() != BLOGGER_DIR {
                return Ok(WalkControl::Continue);
            }
            debug!(path = entry.path(), "Found Blogger export");
            self.scan_blogger(entry.path(), index, &mut summary)?;
            Ok(WalkControl::SkipDir)
        })?;

        info!(
            albums = summary.albums,
            blogs = summary.blogs,
            resources = summary.resources,
            skipped = summary.skipped,
            "Scan complete"
        );
        Ok(summary)
    }

    fn scan_blogger(
        &self,
        blogger: &str,
        index: &mut ResourceIndex,
        summary: &mut ScanSummary,
    ) -> VfsResult<()> {
        for (dir, section) in [(ALBUMS_DIR, Section::Album), (BLOGS_DIR, Section::Blog)] {
            let section_path = join_path(blogger, dir);
            let containers = match self.fs.list_directory(&section_path) {
                Ok(children) => children,
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    warn!(path = %section_path, error = %e, "Failed to list section");
                    summary.skipped += 1;
                    continue;
                }
            };

            for container in containers.iter().filter(|c| c.is_dir()) {
                self.check_cancelled()?;
                match self.scan_container(container, section, index, summary) {
                    Ok(()) => match section {
                        Section::Album => summary.albums += 1,
                        Section::Blog => summary.blogs += 1,
                    },
                    Err(VfsError::Cancelled) => return Err(VfsError::Cancelled),
                    Err(e) => {
                        warn!(path = container.path(), error = %e, "Failed to scan container");
                        summary.skipped += 1;
                    }
                }
            }
        }
        Ok(())
    }

    fn scan_container(
        &self,
        container: &Entry,
        section: Section,
        index: &mut ResourceIndex,
        summary: &mut ScanSummary,
    ) -> VfsResult<()> {
        let files = self.fs.list_directory(container.path())?;
        for file in files.iter().filter(|f| f.is_file()) {
            self.check_cancelled()?;
            if !section.is_resource(file.name()) {
                debug!(path = file.path(), "Skipping metadata file");
                continue;
            }

            let metadata = match section {
                Section::Album => self.sidecar_metadata(file),
                Section::Blog => None,
            };
            index.add(container.name(), container.path(), file.clone(), metadata);
            summary.resources += 1;
        }
        Ok(())
    }

    fn sidecar_metadata(&self, file: &Entry) -> Option<ResourceMetadata> {
        let sidecar = format!("{}{}", file.path(), SIDECAR_EXTENSION);
        match self.fs.stat(&sidecar) {
            Ok(entry) if entry.is_file() => {}
            _ => return None,
        }

        match self.metadata.load(self.fs, file, &sidecar) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %sidecar, error = %e, "Unreadable sidecar, using entry metadata");
                None
            }
        }
    }

    fn check_cancelled(&self) -> VfsResult<()> {
        if self.cancel.is_cancelled() {
            Err(VfsError::Cancelled)
        } else {
            Ok(())
        }
    }
}
