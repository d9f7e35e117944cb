//! Filesystem backed by a host directory.

use std::fs::{self, File, Metadata};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::entry::{ContentLocator, Entry, Locator};
use super::error::{VfsError, VfsResult};
use super::path::{join_path, normalize_path};
use super::{ByteStream, FileSystem};

/// Thin adapter over a host directory tree.
///
/// Every call goes to the host filesystem; nothing is cached. Requested paths
/// are joined onto the root as given: `..` segments are not rejected and can
/// reach outside the root.
#[derive(Debug, Clone)]
pub struct DirectoryFs {
    root: PathBuf,
}

impl DirectoryFs {
    /// Create a filesystem rooted at `root`, which must be an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> VfsResult<Self> {
        let root = root.into();
        let metadata = fs::metadata(&root).map_err(|e| map_io(&root, "", e))?;
        if !metadata.is_dir() {
            return Err(VfsError::not_a_directory(root.display().to_string()));
        }

        debug!(root = %root.display(), "Directory filesystem ready");
        Ok(Self { root })
    }

    /// The host directory this filesystem reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn host_path(&self, path: &str) -> PathBuf {
        let path = normalize_path(path);
        if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }

    fn metadata(&self, path: &str) -> VfsResult<(PathBuf, Metadata)> {
        let host = self.host_path(path);
        let metadata = fs::metadata(&host).map_err(|e| map_io(&host, path, e))?;
        Ok((host, metadata))
    }
}

impl FileSystem for DirectoryFs {
    fn stat(&self, path: &str) -> VfsResult<Entry> {
        let (host, metadata) = self.metadata(path)?;
        Ok(entry_from_metadata(normalize_path(path), host, &metadata))
    }

    fn open(&self, path: &str) -> VfsResult<ByteStream<'_>> {
        let (host, metadata) = self.metadata(path)?;
        if metadata.is_dir() {
            return Err(VfsError::is_a_directory(normalize_path(path)));
        }
        let file = File::open(&host).map_err(|e| map_io(&host, path, e))?;
        Ok(Box::new(file))
    }

    fn list_directory(&self, path: &str) -> VfsResult<Vec<Entry>> {
        let (host, metadata) = self.metadata(path)?;
        if !metadata.is_dir() {
            return Err(VfsError::not_a_directory(normalize_path(path)));
        }

        let parent = normalize_path(path);
        let mut children = Vec::new();
        for dir_entry in fs::read_dir(&host).map_err(|e| map_io(&host, path, e))? {
            let dir_entry = dir_entry.map_err(|e| VfsError::io(&host, e))?;
            let child_host = dir_entry.path();
            // Follows symlinks, like stat on the same path would.
            let child_metadata = match fs::metadata(&child_host) {
                Ok(m) => m,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(VfsError::io(&child_host, e)),
            };
            let name = dir_entry.file_name().to_string_lossy().into_owned();
            children.push(entry_from_metadata(
                &join_path(parent, &name),
                child_host,
                &child_metadata,
            ));
        }

        children.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(children)
    }

    fn open_entry(&self, entry: &Entry) -> VfsResult<ByteStream<'_>> {
        match &entry.locator().0 {
            Locator::Host(host) if host.starts_with(&self.root) => {
                let file = File::open(host).map_err(|e| map_io(host, entry.path(), e))?;
                Ok(Box::new(file))
            }
            _ => self.open(entry.path()),
        }
    }
}

fn entry_from_metadata(path: &str, host: PathBuf, metadata: &Metadata) -> Entry {
    let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
    if metadata.is_dir() {
        Entry::directory(path, modified)
    } else {
        Entry::file(path, metadata.len(), modified, ContentLocator::host(host))
    }
}

fn map_io(host: &Path, path: &str, err: io::Error) -> VfsError {
    if err.kind() == io::ErrorKind::NotFound {
        VfsError::not_found(normalize_path(path))
    } else {
        VfsError::io(host, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn create_tree(temp: &TempDir) {
        let root = temp.path();
        fs::create_dir_all(root.join("Blogger/Albums/Trip")).unwrap();
        fs::write(root.join("Blogger/Albums/Trip/IMG_0001.jpg"), b"jpeg bytes").unwrap();
        fs::write(root.join("Blogger/Albums/Trip/IMG_0001.jpg.json"), b"{}").unwrap();
        fs::write(root.join("archive_browser.html"), b"<html></html>").unwrap();
    }

    #[test]
    fn test_new_rejects_missing_root() {
        let temp = TempDir::new().unwrap();
        let result = DirectoryFs::new(temp.path().join("missing"));
        assert!(matches!(result, Err(VfsError::NotFound { .. })));
    }

    #[test]
    fn test_new_rejects_file_root() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.zip");
        fs::write(&file, b"PK").unwrap();

        let result = DirectoryFs::new(&file);
        assert!(matches!(result, Err(VfsError::NotADirectory { .. })));
    }

    #[test]
    fn test_stat_file_and_directory() {
        let temp = TempDir::new().unwrap();
        create_tree(&temp);
        let fs = DirectoryFs::new(temp.path()).unwrap();

        let file = fs.stat("Blogger/Albums/Trip/IMG_0001.jpg").unwrap();
        assert!(file.is_file());
        assert_eq!(file.size(), 10);
        assert_eq!(file.path(), "Blogger/Albums/Trip/IMG_0001.jpg");
        assert!(file.modified().is_some());

        let dir = fs.stat("Blogger/Albums").unwrap();
        assert!(dir.is_dir());

        let root = fs.stat(".").unwrap();
        assert!(root.is_dir());
        assert_eq!(root.path(), "");
    }

    #[test]
    fn test_open_reads_content() {
        let temp = TempDir::new().unwrap();
        create_tree(&temp);
        let fs = DirectoryFs::new(temp.path()).unwrap();

        let mut content = String::new();
        fs.open("archive_browser.html")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<html></html>");
    }

    #[test]
    fn test_open_directory_fails() {
        let temp = TempDir::new().unwrap();
        create_tree(&temp);
        let fs = DirectoryFs::new(temp.path()).unwrap();

        assert!(matches!(
            fs.open("Blogger"),
            Err(VfsError::IsADirectory { .. })
        ));
    }

    #[test]
    fn test_list_directory_sorted() {
        let temp = TempDir::new().unwrap();
        create_tree(&temp);
        let fs = DirectoryFs::new(temp.path()).unwrap();

        let names: Vec<_> = fs
            .list_directory("Blogger/Albums/Trip")
            .unwrap()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["IMG_0001.jpg", "IMG_0001.jpg.json"]);

        let root: Vec<_> = fs
            .list_directory("")
            .unwrap()
            .iter()
            .map(|e| e.display_name())
            .collect();
        assert_eq!(root, vec!["Blogger/", "archive_browser.html"]);
    }

    #[test]
    fn test_list_file_fails() {
        let temp = TempDir::new().unwrap();
        create_tree(&temp);
        let fs = DirectoryFs::new(temp.path()).unwrap();

        assert!(matches!(
            fs.list_directory("archive_browser.html"),
            Err(VfsError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_missing_path_not_found() {
        let temp = TempDir::new().unwrap();
        create_tree(&temp);
        let fs = DirectoryFs::new(temp.path()).unwrap();

        assert!(fs.stat("nope").unwrap_err().is_not_found());
        assert!(matches!(fs.open("nope"), Err(VfsError::NotFound { .. })));
        assert!(fs.list_directory("nope").unwrap_err().is_not_found());
    }
}
