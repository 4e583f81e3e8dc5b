//! Project directories and the mind-files they are packed into.

use std::fmt;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::archive;
use crate::error::{MindError, MindResult};
use crate::scratch::ScratchDir;
use crate::template::ensure_template;

/// Who is responsible for a project directory's lifetime.
#[derive(Debug)]
pub enum Ownership {
    /// User-owned directory that outlives the handle.
    Persistent,
    /// Scratch directory removed when the handle is dropped.
    Ephemeral(ScratchDir),
}

/// A templated project tree on disk.
#[derive(Debug)]
pub struct ProjectDirectory {
    root: PathBuf,
    ownership: Ownership,
}

impl ProjectDirectory {
    /// Open an existing directory, filling in any missing template members.
    pub fn open(root: impl Into<PathBuf>) -> MindResult<Self> {
        let root = root.into();
        if !root.exists() {
            return Err(MindError::missing_path(&root));
        }
        ensure_template(&root)?;
        Ok(Self {
            root,
            ownership: Ownership::Persistent,
        })
    }

    /// Create a new persistent directory from the template.
    pub fn create(root: impl Into<PathBuf>) -> MindResult<Self> {
        let root = root.into();
        ensure_template(&root)?;
        Ok(Self {
            root,
            ownership: Ownership::Persistent,
        })
    }

    /// Extract a mind-file into a scratch directory owned by the returned handle.
    pub fn extract(archive_path: &Path, scratch_parent: Option<&Path>) -> MindResult<Self> {
        let scratch = archive::extract_to_ephemeral(archive_path, scratch_parent)?;
        let root = scratch.path().to_path_buf();
        // On failure `scratch` is dropped here and the extraction removed.
        ensure_template(&root)?;
        Ok(Self {
            root,
            ownership: Ownership::Ephemeral(scratch),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(self.ownership, Ownership::Ephemeral(_))
    }

    /// Every regular file under the root, as sorted paths relative to it.
    pub fn files(&self) -> MindResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(std::io::Error::other)?;
            if entry.file_type().is_file() {
                if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                    files.push(relative.to_path_buf());
                }
            }
        }
        files.sort();
        Ok(files)
    }

    /// Pack this directory into a mind-file, replacing any existing file.
    pub fn export(&self, archive_path: &Path, compression_level: i64) -> MindResult<ProjectArchive> {
        archive::export(&self.root, archive_path, compression_level)?;
        Ok(ProjectArchive::new(archive_path))
    }

    /// Release the directory. Ephemeral storage is removed and errors reported.
    pub fn close(self) -> MindResult<()> {
        match self.ownership {
            Ownership::Ephemeral(scratch) => scratch.close(),
            Ownership::Persistent => Ok(()),
        }
    }
}

/// A mind-file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectArchive {
    path: PathBuf,
}

impl ProjectArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Size of the file in bytes.
    pub fn size(&self) -> MindResult<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    pub fn members(&self) -> MindResult<Vec<String>> {
        archive::list_members(&self.path)
    }
}

impl fmt::Display for ProjectArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_requires_existing_directory() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            ProjectDirectory::open(temp.path().join("absent")),
            Err(MindError::NotFound(_))
        ));
    }

    #[test]
    fn test_create_lists_template_files() {
        let temp = TempDir::new().unwrap();
        let dir = ProjectDirectory::create(temp.path().join("mind")).unwrap();

        assert!(!dir.is_ephemeral());
        let files = dir.files().unwrap();
        assert!(files.len() >= 5);
        assert!(files.contains(&PathBuf::from("model.py")));
    }

    #[test]
    fn test_extract_is_ephemeral_and_cleaned_up() {
        let temp = TempDir::new().unwrap();
        let source = ProjectDirectory::create(temp.path().join("source")).unwrap();
        std::fs::write(source.root().join("model.py"), "weights").unwrap();
        let archive = source
            .export(&temp.path().join("source.mind"), 9)
            .unwrap();
        assert!(archive.exists());
        assert!(archive.size().unwrap() > 0);

        let extracted = ProjectDirectory::extract(archive.path(), None).unwrap();
        assert!(extracted.is_ephemeral());
        let root = extracted.root().to_path_buf();
        assert_eq!(
            std::fs::read_to_string(root.join("model.py")).unwrap(),
            "weights"
        );
        assert_eq!(extracted.files().unwrap(), source.files().unwrap());

        extracted.close().unwrap();
        assert!(!root.exists());
    }
}
