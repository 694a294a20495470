//! The live site directory and how it gets replaced.
//!
//! # Swap procedure
//!
//! A deployment never writes into the directory being served:
//!
//! 1. Extract into a fresh sibling, `.<name>.staging-XXXX`.
//! 2. Move the live root aside into `.<name>.old-XXXX/`.
//! 3. Rename the staging directory onto the root path.
//! 4. Delete the old tree.
//!
//! A bad bundle fails in step 1 and the live site is untouched. Steps 2 and 3
//! are plain renames within one parent directory, so readers see either the
//! old tree or the new one (or, for the instant between the two renames, a
//! missing root, which the static handler treats as "not found").
//!
//! Siblings left behind by a crash mid-swap are removed by [`Site::open`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::extract::{self, ExtractError, ExtractReport, Layout};

/// Document served for any path that does not name a file.
pub const INDEX: &str = "index.html";

const STAGING_TAG: &str = ".staging-";
const OLD_TAG: &str = ".old-";

/// The directory being served, plus the lock that serialises deployments.
///
/// Share it behind an `Arc`; every handler that touches the root goes through
/// this type.
pub struct Site {
    root: PathBuf,
    layout: Layout,
    /// Held by the blocking task doing the work, not by the request future,
    /// so a dropped request cannot release it early.
    deploying: Arc<Mutex<()>>,
}

impl Site {
    /// Creates `root` if it is missing and clears debris from an interrupted
    /// deployment. Existing content is kept and served.
    pub fn open(root: impl AsRef<Path>, layout: Layout) -> io::Result<Self> {
        fs::create_dir_all(root.as_ref())?;
        let root = fs::canonicalize(root.as_ref())?;
        if root.parent().is_none() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "the filesystem root cannot be a site directory",
            ));
        }
        sweep_leftovers(&root);
        Ok(Self { root, layout, deploying: Arc::new(Mutex::new(())) })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX)
    }

    /// Whether an index document is currently live.
    pub async fn is_deployed(&self) -> bool {
        tokio::fs::metadata(self.index_path())
            .await
            .is_ok_and(|m| m.is_file())
    }

    /// Replaces the live site with the content of the zip at `archive`.
    ///
    /// Concurrent calls queue on an internal lock. The archive file is left
    /// alone; removing it is the caller's business.
    ///
    /// Dropping the returned future does not stop a deployment that has
    /// started: the extraction and swap run to completion, and the next
    /// deployment waits for them.
    pub async fn deploy(&self, archive: &Path) -> Result<ExtractReport, ExtractError> {
        let guard = Arc::clone(&self.deploying).lock_owned().await;

        let root = self.root.clone();
        let layout = self.layout.clone();
        let archive = archive.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            replace(&root, &archive, &layout)
        })
        .await
        .map_err(|e| ExtractError::Io {
            path: self.root.clone(),
            source: io::Error::other(e),
        })?
    }
}

fn replace(root: &Path, archive: &Path, layout: &Layout) -> Result<ExtractReport, ExtractError> {
    let (parent, name) = split_root(root)?;

    let staging = tempfile::Builder::new()
        .prefix(&format!(".{name}{STAGING_TAG}"))
        .tempdir_in(parent)
        .map_err(ExtractError::io_at(parent))?;

    let report = extract::extract(archive, staging.path(), layout)?;
    publish_permissions(staging.path())?;
    swap(staging.path(), root, parent, &name)?;

    // `staging` now points at a path that no longer exists; dropping it is a
    // no-op.
    Ok(report)
}

fn swap(staged: &Path, root: &Path, parent: &Path, name: &str) -> Result<(), ExtractError> {
    let old = tempfile::Builder::new()
        .prefix(&format!(".{name}{OLD_TAG}"))
        .tempdir_in(parent)
        .map_err(ExtractError::io_at(parent))?;
    let parked = old.path().join(name);

    let had_root = match fs::rename(root, &parked) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => return Err(ExtractError::io_at(root)(e)),
    };

    if let Err(e) = fs::rename(staged, root) {
        if had_root {
            if let Err(restore) = fs::rename(&parked, root) {
                warn!(root = %root.display(), "failed to restore previous site: {restore}");
            }
        }
        return Err(ExtractError::io_at(root)(e));
    }

    // Dropping `old` removes the previous tree.
    if let Err(e) = old.close() {
        warn!(root = %root.display(), "failed to remove previous site: {e}");
    }
    Ok(())
}

fn split_root(root: &Path) -> Result<(&Path, String), ExtractError> {
    match (root.parent(), root.file_name()) {
        (Some(parent), Some(name)) => Ok((parent, name.to_string_lossy().into_owned())),
        _ => Err(ExtractError::io_at(root)(io::Error::new(
            io::ErrorKind::InvalidInput,
            "site root has no parent directory",
        ))),
    }
}

/// Temporary directories are created `0700`; the served tree must be
/// readable by whoever else needs it.
fn publish_permissions(dir: &Path) -> Result<(), ExtractError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o755))
            .map_err(ExtractError::io_at(dir))?;
    }
    #[cfg(not(unix))]
    let _ = dir;
    Ok(())
}

fn sweep_leftovers(root: &Path) {
    let Ok((parent, name)) = split_root(root) else { return };
    let staging = format!(".{name}{STAGING_TAG}");
    let old = format!(".{name}{OLD_TAG}");

    let Ok(entries) = fs::read_dir(parent) else { return };
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if !file_name.starts_with(&staging) && !file_name.starts_with(&old) {
            continue;
        }
        match fs::remove_dir_all(entry.path()) {
            Ok(()) => info!(path = %entry.path().display(), "removed leftover from interrupted deploy"),
            Err(e) => warn!(path = %entry.path().display(), "failed to remove leftover: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::open(dir.path().join("a/b/site"), Layout::default()).unwrap();
        assert!(site.root().is_dir());
        assert!(site.root().is_absolute());
    }

    #[test]
    fn open_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("site");
        fs::create_dir(&root).unwrap();
        fs::write(root.join(INDEX), "old").unwrap();

        let site = Site::open(&root, Layout::default()).unwrap();
        assert_eq!(fs::read_to_string(site.index_path()).unwrap(), "old");
    }

    #[test]
    fn open_sweeps_interrupted_deploys() {
        let dir = tempfile::tempdir().unwrap();
        let leftovers = [".site.staging-abc123", ".site.old-xyz789"];
        for leftover in leftovers {
            fs::create_dir_all(dir.path().join(leftover).join("nested")).unwrap();
        }
        fs::create_dir(dir.path().join(".other.staging-keep")).unwrap();

        Site::open(dir.path().join("site"), Layout::default()).unwrap();

        for leftover in leftovers {
            assert!(!dir.path().join(leftover).exists(), "{leftover} survived");
        }
        assert!(dir.path().join(".other.staging-keep").exists());
    }

    #[tokio::test]
    async fn readiness_follows_index() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::open(dir.path().join("site"), Layout::default()).unwrap();
        assert!(!site.is_deployed().await);
        fs::write(site.index_path(), "hi").unwrap();
        assert!(site.is_deployed().await);
    }

    #[test]
    fn swap_replaces_root_and_drops_old_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("site");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("stale.txt"), "stale").unwrap();
        let staged = dir.path().join("staged");
        fs::create_dir(&staged).unwrap();
        fs::write(staged.join(INDEX), "new").unwrap();

        swap(&staged, &root, dir.path(), "site").unwrap();

        assert_eq!(fs::read_to_string(root.join(INDEX)).unwrap(), "new");
        assert!(!root.join("stale.txt").exists());
        assert!(!staged.exists());
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("site")]);
    }
}
