//! Backend selection for an export bundle.

use std::path::Path;

use tracing::info;

use super::archive::ArchiveFs;
use super::directory::DirectoryFs;
use super::entry::Entry;
use super::error::{VfsError, VfsResult};
use super::{ByteStream, FileSystem};
use crate::config::VfsConfig;

/// An opened export bundle.
///
/// The variant is chosen once by [`Bundle::open`]; callers only ever talk to
/// the [`FileSystem`] capability.
#[derive(Debug)]
pub enum Bundle {
    Directory(DirectoryFs),
    Archive(ArchiveFs),
}

impl Bundle {
    /// Classify `inputs` and open the matching backend.
    ///
    /// - every input ends in `.zip` (any case): archive shards; a single input
    ///   may be a glob pattern such as `takeout-*.zip`
    /// - exactly one input naming a host directory: directory backend
    /// - anything else: [`VfsError::UnsupportedInput`]
    pub fn open<P: AsRef<Path>>(inputs: &[P], config: &VfsConfig) -> VfsResult<Self> {
        if inputs.is_empty() {
            return Err(VfsError::UnsupportedInput("no input given".to_string()));
        }

        if inputs.iter().all(|p| has_zip_extension(p.as_ref())) {
            let fs = ArchiveFs::open(inputs, config)?;
            info!(shards = fs.shard_paths().count(), "Opened archive bundle");
            return Ok(Bundle::Archive(fs));
        }

        match inputs {
            [single] if single.as_ref().is_dir() => {
                let fs = DirectoryFs::new(single.as_ref())?;
                info!(root = %fs.root().display(), "Opened directory bundle");
                Ok(Bundle::Directory(fs))
            }
            [single] => Err(VfsError::UnsupportedInput(format!(
                "{} is neither a directory nor a .zip archive",
                single.as_ref().display()
            ))),
            _ => Err(VfsError::UnsupportedInput(
                "multiple inputs must all be .zip archives".to_string(),
            )),
        }
    }

    /// Short label of the active backend, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Bundle::Directory(_) => "directory",
            Bundle::Archive(_) => "archive",
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, Bundle::Archive(_))
    }

    /// Release backend resources. Only archives hold any.
    pub fn close(&mut self) {
        if let Bundle::Archive(fs) = self {
            fs.close();
        }
    }

    fn backend(&self) -> &dyn FileSystem {
        match self {
            Bundle::Directory(fs) => fs,
            Bundle::Archive(fs) => fs,
        }
    }
}

impl FileSystem for Bundle {
    fn stat(&self, path: &str) -> VfsResult<Entry> {
        self.backend().stat(path)
    }

    fn open(&self, path: &str) -> VfsResult<ByteStream<'_>> {
        self.backend().open(path)
    }

    fn list_directory(&self, path: &str) -> VfsResult<Vec<Entry>> {
        self.backend().list_directory(path)
    }

    fn open_entry(&self, entry: &Entry) -> VfsResult<ByteStream<'_>> {
        self.backend().open_entry(entry)
    }
}

fn has_zip_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

#[cfg(test)]
mod tests {
    use super::super::archive::testing::ZipBuilder;
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_zip_extension_is_case_insensitive() {
        assert!(has_zip_extension(Path::new("takeout-001.zip")));
        assert!(has_zip_extension(Path::new("TAKEOUT.ZIP")));
        assert!(has_zip_extension(Path::new("takeout-*.zip")));
        assert!(!has_zip_extension(Path::new("takeout.tgz")));
        assert!(!has_zip_extension(Path::new("Takeout")));
    }

    #[test]
    fn test_directory_input() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("Takeout/Blogger")).unwrap();

        let bundle = Bundle::open(&[temp.path()], &VfsConfig::default()).unwrap();
        assert_eq!(bundle.kind(), "directory");
        assert!(bundle.stat("Takeout/Blogger").unwrap().is_dir());
    }

    #[test]
    fn test_archive_input() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("takeout-001.ZIP");
        ZipBuilder::new()
            .stored("Takeout/Blogger/Blogs/Travel/post.html", b"<p>hi</p>")
            .write_to(&path)
            .unwrap();

        let bundle = Bundle::open(&[&path], &VfsConfig::default()).unwrap();
        assert!(bundle.is_archive());

        let mut buf = String::new();
        bundle
            .open("Takeout/Blogger/Blogs/Travel/post.html")
            .unwrap()
            .read_to_string(&mut buf)
            .unwrap();
        assert_eq!(buf, "<p>hi</p>");
    }

    #[test]
    fn test_close_forwards_to_archive() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("takeout.zip");
        ZipBuilder::new().stored("a.txt", b"a").write_to(&path).unwrap();

        let mut bundle = Bundle::open(&[&path], &VfsConfig::default()).unwrap();
        bundle.close();
        assert!(matches!(bundle.stat("a.txt"), Err(VfsError::Closed)));
    }

    #[test]
    fn test_unsupported_inputs() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("notes.txt");
        std::fs::write(&file, b"x").unwrap();

        let no_inputs: [&Path; 0] = [];
        assert!(matches!(
            Bundle::open(&no_inputs, &VfsConfig::default()),
            Err(VfsError::UnsupportedInput(_))
        ));
        assert!(matches!(
            Bundle::open(&[&file], &VfsConfig::default()),
            Err(VfsError::UnsupportedInput(_))
        ));
        assert!(matches!(
            Bundle::open(&[temp.path(), temp.path()], &VfsConfig::default()),
            Err(VfsError::UnsupportedInput(_))
        ));
    }
}
