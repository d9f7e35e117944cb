//! Depth-first traversal over any [`FileSystem`].

use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::entry::Entry;
use super::error::{VfsError, VfsResult};
use super::path::normalize_path;
use super::FileSystem;

/// What the walk should do after visiting an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    /// Keep going; descend into the entry if it is a directory.
    Continue,
    /// Do not descend into this directory. Same as `Continue` for files.
    SkipDir,
}

/// Visit every descendant of `root` in pre-order, children sorted by local name.
///
/// The root itself is not visited. The token is checked before each visit, so
/// cancellation takes effect between entries and never interrupts a visitor.
/// The first error from the filesystem or the visitor ends the walk.
pub fn walk<F, V>(fs: &F, root: &str, cancel: &CancellationToken, mut visit: V) -> VfsResult<()>
where
    F: FileSystem + ?Sized,
    V: FnMut(&Entry) -> VfsResult<WalkControl>,
{
    let root = normalize_path(root);
    let mut pending: Vec<Entry> = fs.list_directory(root)?;
    pending.reverse();

    while let Some(entry) = pending.pop() {
        if cancel.is_cancelled() {
            return Err(VfsError::Cancelled);
        }

        let control = visit(&entry)?;
        if entry.is_dir() && control == WalkControl::Continue {
            trace!(path = entry.path(), "Descending");
            let children = fs.list_directory(entry.path())?;
            pending.extend(children.into_iter().rev());
        }
    }

    Ok(())
}
