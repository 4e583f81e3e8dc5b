//! Scoped temporary directories for ephemeral Minds.
//!
//! A [`ScratchDir`] is removed when it goes out of scope, on every exit path.
//! History stores contain read-only object files, so write permission is
//! restored on the whole tree before removal.

use std::fs;
use std::io;
use std::path::Path;

use tempfile::TempDir;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::MindResult;

const SCRATCH_PREFIX: &str = "mind-";

/// Temporary directory owned by exactly one handle.
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
}

impl ScratchDir {
    /// Create a scratch directory under `parent`, or the system temp dir when `None`.
    pub fn new_in(parent: Option<&Path>) -> MindResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let dir = match parent {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        debug!(path = %dir.path().display(), "Acquired scratch directory");
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            // Only reachable inside close/drop, after which the handle is gone.
            None => Path::new(""),
        }
    }

    /// Remove the directory now, reporting failures instead of logging them.
    pub fn close(mut self) -> MindResult<()> {
        match self.dir.take() {
            Some(dir) => Ok(release(dir)?),
            None => Ok(()),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = release(dir) {
                warn!(path = %path.display(), error = %e, "Failed to remove scratch directory");
            }
        }
    }
}

fn release(dir: TempDir) -> io::Result<()> {
    make_tree_writable(dir.path())?;
    let path = dir.path().to_path_buf();
    dir.close()?;
    debug!(path = %path.display(), "Released scratch directory");
    Ok(())
}

/// Recursively delete `path`, clearing read-only attributes first.
pub fn remove_tree(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    make_tree_writable(path)?;
    fs::remove_dir_all(path)
}

fn make_tree_writable(path: &Path) -> io::Result<()> {
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        if entry.path_is_symlink() {
            continue;
        }
        let metadata = entry.metadata().map_err(io::Error::other)?;
        let mut permissions = metadata.permissions();
        if permissions.readonly() {
            set_writable(&mut permissions);
            fs::set_permissions(entry.path(), permissions)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn set_writable(permissions: &mut fs::Permissions) {
    use std::os::unix::fs::PermissionsExt;
    permissions.set_mode(permissions.mode() | 0o200);
}

#[cfg(not(unix))]
fn set_writable(permissions: &mut fs::Permissions) {
    #[allow(clippy::permissions_set_readonly_false)]
    permissions.set_readonly(false);
}
