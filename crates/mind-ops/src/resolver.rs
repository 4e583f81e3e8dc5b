//! Mind resolver: turns a mind-file and/or directory path into one
//! consistent (directory, optional mind-file) pair.
//!
//! | mind-file | directory | dir exists | result                                          |
//! |-----------|-----------|------------|-------------------------------------------------|
//! | yes       | no        | n/a        | extract into an ephemeral directory             |
//! | no        | yes       | no         | template a new persistent directory             |
//! | no        | yes       | yes        | open the existing directory                     |
//! | yes       | yes       | no         | template, then export if the mind-file is absent |
//! | yes       | yes       | yes        | open, then export if the mind-file is absent    |
//!
//! An existing mind-file is never overwritten here.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::Config;
use crate::directory::{ProjectArchive, ProjectDirectory};
use crate::error::{MindError, MindResult};
use crate::scratch::remove_tree;

/// Paths a Mind is constructed from. At least one must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MindSource {
    pub archive: Option<PathBuf>,
    pub directory: Option<PathBuf>,
}

impl MindSource {
    pub fn new(archive: Option<PathBuf>, directory: Option<PathBuf>) -> Self {
        Self { archive, directory }
    }

    /// A mind-file only; it is extracted to a scratch directory.
    pub fn archive(path: impl Into<PathBuf>) -> Self {
        Self::new(Some(path.into()), None)
    }

    /// A directory only; opened or templated.
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::new(None, Some(path.into()))
    }

    /// A directory paired with the mind-file it is packed into.
    pub fn both(archive: impl Into<PathBuf>, directory: impl Into<PathBuf>) -> Self {
        Self::new(Some(archive.into()), Some(directory.into()))
    }
}

/// How the directory was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Extracted,
    Created,
    Opened,
}

/// Outcome of resolving a [`MindSource`].
#[derive(Debug)]
pub struct Resolved {
    pub directory: ProjectDirectory,
    pub archive: Option<ProjectArchive>,
    pub resolution: Resolution,
    /// Whether a new mind-file was written during resolution.
    pub exported: bool,
}

/// Resolve a source into a directory and optional mind-file.
pub fn resolve(source: &MindSource, config: &Config) -> MindResult<Resolved> {
    match (&source.archive, &source.directory) {
        (None, None) => Err(MindError::InvalidArgument(
            "either a mind-file or a directory is required".to_string(),
        )),

        (Some(archive), None) => {
            if !archive.is_file() {
                return Err(MindError::missing_path(archive));
            }
            let directory = ProjectDirectory::extract(archive, config.scratch_dir.as_deref())?;
            info!(
                archive = %archive.display(),
                path = %directory.root().display(),
                "Extracted mind-file to ephemeral directory"
            );
            Ok(Resolved {
                directory,
                archive: Some(ProjectArchive::new(archive)),
                resolution: Resolution::Extracted,
                exported: false,
            })
        }

        (None, Some(dir)) => {
            let (directory, resolution) = open_or_create(dir)?;
            Ok(Resolved {
                directory,
                archive: None,
                resolution,
                exported: false,
            })
        }

        (Some(archive), Some(dir)) => {
            let (directory, resolution) = open_or_create(dir)?;

            if archive.exists() {
                return Ok(Resolved {
                    directory,
                    archive: Some(ProjectArchive::new(archive)),
                    resolution,
                    exported: false,
                });
            }

            match directory.export(archive, config.compression_level) {
                Ok(packed) => Ok(Resolved {
                    directory,
                    archive: Some(packed),
                    resolution,
                    exported: true,
                }),
                Err(e) => {
                    if resolution == Resolution::Created {
                        discard_created(directory.root());
                    }
                    Err(e)
                }
            }
        }
    }
}

fn open_or_create(dir: &Path) -> MindResult<(ProjectDirectory, Resolution)> {
    if dir.exists() {
        Ok((ProjectDirectory::open(dir)?, Resolution::Opened))
    } else {
        Ok((ProjectDirectory::create(dir)?, Resolution::Created))
    }
}

/// Roll back a directory templated by a resolution that then failed.
fn discard_created(root: &Path) {
    if let Err(e) = remove_tree(root) {
        warn!(path = %root.display(), error = %e, "Failed to remove partially created directory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::is_templated;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(temp: &TempDir) -> Config {
        Config {
            scratch_dir: Some(temp.path().join("scratch")),
            ..Config::default()
        }
    }

    fn packed_mind(temp: &TempDir) -> PathBuf {
        let source = temp.path().join("packed-src");
        let dir = ProjectDirectory::create(&source).unwrap();
        fs::write(dir.root().join("model.py"), "packed").unwrap();
        let archive = temp.path().join("packed.mind");
        dir.export(&archive, 9).unwrap();
        archive
    }

    #[test]
    fn test_neither_path_is_invalid() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            resolve(&MindSource::default(), &config_in(&temp)),
            Err(MindError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_archive_only_extracts_ephemeral() {
        let temp = TempDir::new().unwrap();
        let archive = packed_mind(&temp);

        let resolved = resolve(&MindSource::archive(&archive), &config_in(&temp)).unwrap();
        assert_eq!(resolved.resolution, Resolution::Extracted);
        assert!(resolved.directory.is_ephemeral());
        assert!(!resolved.exported);
        assert_eq!(resolved.archive.as_ref().map(|a| a.path()), Some(archive.as_path()));

        let root = resolved.directory.root().to_path_buf();
        assert!(root.starts_with(temp.path().join("scratch")));
        assert_eq!(fs::read_to_string(root.join("model.py")).unwrap(), "packed");

        drop(resolved);
        assert!(!root.exists());
    }

    #[test]
    fn test_archive_only_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            resolve(
                &MindSource::archive(temp.path().join("absent.mind")),
                &config_in(&temp)
            ),
            Err(MindError::NotFound(_))
        ));
    }

    #[test]
    fn test_new_directory_is_templated() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("fresh");

        let resolved = resolve(&MindSource::directory(&dir), &config_in(&temp)).unwrap();
        assert_eq!(resolved.resolution, Resolution::Created);
        assert!(!resolved.directory.is_ephemeral());
        assert!(resolved.archive.is_none());
        assert!(is_templated(&dir));

        drop(resolved);
        assert!(dir.exists());
    }

    #[test]
    fn test_existing_directory_is_opened() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("existing");
        ProjectDirectory::create(&dir).unwrap();
        fs::write(dir.join("model.py"), "keep me").unwrap();

        let resolved = resolve(&MindSource::directory(&dir), &config_in(&temp)).unwrap();
        assert_eq!(resolved.resolution, Resolution::Opened);
        assert!(!resolved.directory.is_ephemeral());
        assert_eq!(fs::read_to_string(dir.join("model.py")).unwrap(), "keep me");
    }

    #[test]
    fn test_both_with_new_directory_exports() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("fresh");
        let archive = temp.path().join("fresh.mind");

        let resolved = resolve(&MindSource::both(&archive, &dir), &config_in(&temp)).unwrap();
        assert_eq!(resolved.resolution, Resolution::Created);
        assert!(resolved.exported);
        assert!(archive.is_file());
        assert!(is_templated(&dir));
    }

    #[test]
    fn test_both_with_existing_directory_exports_when_absent() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("existing");
        ProjectDirectory::create(&dir).unwrap();
        let archive = temp.path().join("existing.mind");

        let resolved = resolve(&MindSource::both(&archive, &dir), &config_in(&temp)).unwrap();
        assert_eq!(resolved.resolution, Resolution::Opened);
        assert!(resolved.exported);
        assert!(archive.is_file());
    }

    #[test]
    fn test_both_never_overwrites_existing_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("keep.mind");
        fs::write(&archive, "original bytes").unwrap();

        for dir in [temp.path().join("new-dir"), temp.path().join("new-dir")] {
            let resolved = resolve(&MindSource::both(&archive, &dir), &config_in(&temp)).unwrap();
            assert!(!resolved.exported);
            assert_eq!(fs::read_to_string(&archive).unwrap(), "original bytes");
        }
    }
}
