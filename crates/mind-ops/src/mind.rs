//! The Mind handle: one project directory, its optional mind-file, and the
//! versioned history kept in its `versioning/` member.

use std::path::{Path, PathBuf};

use mind_core::{Bump, Identity, Version};
use mind_git::{CommitInfo, GitBackend, HistoryEngine, ObjectId};
use tracing::info;

use crate::config::Config;
use crate::directory::{ProjectArchive, ProjectDirectory};
use crate::error::{MindError, MindResult};
use crate::resolver::{resolve, MindSource, Resolution};
use crate::versioning::VersionControl;

/// A versioned, packageable machine-learning project.
pub struct Mind<E: HistoryEngine = GitBackend> {
    // Declared first so history handles are released before an ephemeral
    // directory is removed.
    history: VersionControl<E>,
    directory: ProjectDirectory,
    archive: Option<ProjectArchive>,
    compression_level: i64,
}

impl Mind<GitBackend> {
    /// Open a Mind with default configuration.
    pub fn open(source: &MindSource, owner: Identity) -> MindResult<Self> {
        Self::open_with(source, owner, &Config::default())
    }

    /// Resolve `source`, then open or initialize its history.
    ///
    /// If history setup fails, an extracted ephemeral directory is removed
    /// before the error is returned.
    pub fn open_with(source: &MindSource, owner: Identity, config: &Config) -> MindResult<Self> {
        let resolved = resolve(source, config)?;
        let history = VersionControl::init_or_open(resolved.directory.root(), owner)?;

        info!(
            path = %resolved.directory.root().display(),
            ephemeral = resolved.directory.is_ephemeral(),
            created = resolved.resolution == Resolution::Created,
            "Opened mind"
        );

        let mut mind = Self {
            history,
            directory: resolved.directory,
            archive: resolved.archive,
            compression_level: config.compression_level,
        };

        // A mind-file written during resolution predates the history store.
        if resolved.exported {
            mind.export(None)?;
        }
        Ok(mind)
    }
}

impl<E: HistoryEngine> Mind<E> {
    pub fn root(&self) -> &Path {
        self.directory.root()
    }

    pub fn directory(&self) -> &ProjectDirectory {
        &self.directory
    }

    /// The mind-file this Mind came from or was last exported to.
    pub fn archive(&self) -> Option<&ProjectArchive> {
        self.archive.as_ref()
    }

    pub fn is_ephemeral(&self) -> bool {
        self.directory.is_ephemeral()
    }

    pub fn owner(&self) -> &Identity {
        self.history.owner()
    }

    pub fn last_engineer(&self) -> &Identity {
        self.history.last_engineer()
    }

    pub fn history(&self) -> &VersionControl<E> {
        &self.history
    }

    /// Regular files of the project, relative to its root.
    pub fn files(&self) -> MindResult<Vec<PathBuf>> {
        self.directory.files()
    }

    pub fn latest(&self) -> MindResult<Version> {
        self.history.latest()
    }

    pub fn versions(&self) -> MindResult<Vec<Version>> {
        self.history.versions()
    }

    pub fn log(&self) -> MindResult<Vec<CommitInfo>> {
        self.history.log()
    }

    pub fn is_dirty(&self) -> MindResult<bool> {
        self.history.is_dirty()
    }

    /// Save the working tree as `version`.
    pub fn save(&mut self, version: &Version, engineer: Option<Identity>) -> MindResult<ObjectId> {
        self.history.save(version, engineer)
    }

    pub fn save_bump(&mut self, kind: Bump, engineer: Option<Identity>) -> MindResult<Version> {
        self.history.save_bump(kind, engineer)
    }

    pub fn save_major(&mut self, engineer: Option<Identity>) -> MindResult<Version> {
        self.history.save_major(engineer)
    }

    pub fn save_minor(&mut self, engineer: Option<Identity>) -> MindResult<Version> {
        self.history.save_minor(engineer)
    }

    pub fn save_patch(&mut self, engineer: Option<Identity>) -> MindResult<Version> {
        self.history.save_patch(engineer)
    }

    pub fn save_prerelease(&mut self, engineer: Option<Identity>) -> MindResult<Version> {
        self.history.save_prerelease(engineer)
    }

    pub fn save_build(&mut self, engineer: Option<Identity>) -> MindResult<Version> {
        self.history.save_build(engineer)
    }

    pub fn variant(&self) -> MindResult<String> {
        self.history.variant()
    }

    pub fn set_variant(&mut self, name: &str) -> MindResult<()> {
        self.history.set_variant(name)
    }

    pub fn variants(&self) -> MindResult<Vec<String>> {
        self.history.variants()
    }

    /// Pack the project, history included, into a mind-file.
    ///
    /// Writes to `path`, or to the remembered mind-file when `None`, replacing
    /// what is there. The written file becomes the remembered one.
    pub fn export(&mut self, path: Option<&Path>) -> MindResult<&ProjectArchive> {
        let target = match (path, &self.archive) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(archive)) => archive.path().to_path_buf(),
            (None, None) => {
                return Err(MindError::InvalidArgument(
                    "no mind-file path given and none remembered".to_string(),
                ))
            }
        };

        let archive = self.directory.export(&target, self.compression_level)?;
        Ok(self.archive.insert(archive))
    }

    /// Release the Mind, removing an ephemeral directory and reporting errors.
    pub fn close(self) -> MindResult<()> {
        let Mind {
            history, directory, ..
        } = self;
        drop(history);
        directory.close()
    }
}
