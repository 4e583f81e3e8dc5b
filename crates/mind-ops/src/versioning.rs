//! Version-control facade: semantic-version saves and variants on top of a
//! [`HistoryEngine`].
//!
//! Every save is a commit on the checked-out variant plus an annotated
//! `v<semver>` tag. The owner is author and tagger of everything; the engineer
//! doing a save is its committer.

use std::path::Path;

use mind_core::{
    bump, newest, parse_tag, tag_name, Bump, Identity, Version, BASE_VERSION,
};
use mind_git::{
    CommitInfo, EngineError, GitBackend, HistoryEngine, ObjectId, BRANCH_PREFIX, TAG_REF_PREFIX,
};
use tracing::{debug, info, warn};

use crate::error::{MindError, MindResult};

/// Message of the root commit and its `v0.0.0` tag.
pub const BASE_MESSAGE: &str = "Base Template";

/// Versioned history of one project.
pub struct VersionControl<E: HistoryEngine = GitBackend> {
    engine: E,
    owner: Identity,
    last_engineer: Identity,
}

impl VersionControl<GitBackend> {
    /// Open the history under `root/versioning`, initializing it if absent.
    pub fn init_or_open(root: &Path, owner: Identity) -> MindResult<Self> {
        let engine = if GitBackend::exists(root) {
            GitBackend::open(root)?
        } else {
            GitBackend::init(root)?
        };
        Self::attach(engine, owner)
    }
}

impl<E: HistoryEngine> VersionControl<E> {
    /// Wrap an engine, creating the base commit and `v0.0.0` tag when missing.
    pub fn attach(mut engine: E, owner: Identity) -> MindResult<Self> {
        let tip = match engine.get_head()?.target {
            Some(tip) => tip,
            None => {
                let tree = engine.stage_all_and_write_tree()?;
                let base = engine.create_commit(&[], &tree, &owner, &owner, BASE_MESSAGE)?;
                engine.update_head(&base)?;
                info!(commit = base.short(), "Created base commit");
                base
            }
        };

        let base_tag = tag_name(&BASE_VERSION);
        if engine
            .resolve_ref(&format!("{TAG_REF_PREFIX}{base_tag}"))?
            .is_none()
        {
            let root = root_commit(&engine, &tip)?;
            engine.create_tag(&base_tag, &root, &owner, BASE_MESSAGE)?;
            info!(commit = root.short(), tag = %base_tag, "Tagged base commit");
        }

        let tip_info = engine.commit_info(&tip)?;
        let last_engineer = if tip_info.parents.is_empty() {
            owner.clone()
        } else {
            tip_info.committer
        };

        Ok(Self {
            engine,
            owner,
            last_engineer,
        })
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    /// Committer of the most recent save.
    pub fn last_engineer(&self) -> &Identity {
        &self.last_engineer
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Commit the working tree on the current variant and tag it `v{version}`.
    ///
    /// Without an explicit engineer the last recorded one is used. Nothing in
    /// history moves unless commit, tag and variant update all succeed.
    pub fn save(&mut self, version: &Version, engineer: Option<Identity>) -> MindResult<ObjectId> {
        let tag = tag_name(version);
        if self
            .engine
            .resolve_ref(&format!("{TAG_REF_PREFIX}{tag}"))?
            .is_some()
        {
            return Err(MindError::VersionCollision { tag });
        }

        let engineer = engineer.unwrap_or_else(|| self.last_engineer.clone());
        let tip = self.tip()?;

        let tree = self.engine.stage_all_and_write_tree()?;
        if tree == self.engine.commit_info(&tip)?.tree {
            return Err(MindError::NoChanges {
                variant: self.variant()?,
            });
        }

        let message = format!("Version {version}");
        let commit = self.engine.create_commit(
            std::slice::from_ref(&tip),
            &tree,
            &self.owner,
            &engineer,
            &message,
        )?;

        // An unreferenced commit is harmless if tagging fails.
        self.engine
            .create_tag(&tag, &commit, &self.owner, &message)
            .map_err(|e| match e {
                EngineError::RefExists(_) => MindError::VersionCollision { tag: tag.clone() },
                other => other.into(),
            })?;

        if let Err(e) = self.engine.update_head(&commit) {
            if let Err(undo) = self.engine.delete_tag(&tag) {
                warn!(tag = %tag, error = %undo, "Failed to remove tag of aborted save");
            }
            return Err(e.into());
        }

        info!(
            version = %version,
            commit = commit.short(),
            engineer = %engineer,
            "Saved version"
        );
        self.last_engineer = engineer;
        Ok(commit)
    }

    /// Bump the latest version and save under the new one.
    pub fn save_bump(&mut self, kind: Bump, engineer: Option<Identity>) -> MindResult<Version> {
        let next = bump(kind, &self.latest()?)?;
        self.save(&next, engineer)?;
        Ok(next)
    }

    pub fn save_major(&mut self, engineer: Option<Identity>) -> MindResult<Version> {
        self.save_bump(Bump::Major, engineer)
    }

    pub fn save_minor(&mut self, engineer: Option<Identity>) -> MindResult<Version> {
        self.save_bump(Bump::Minor, engineer)
    }

    pub fn save_patch(&mut self, engineer: Option<Identity>) -> MindResult<Version> {
        self.save_bump(Bump::Patch, engineer)
    }

    pub fn save_prerelease(&mut self, engineer: Option<Identity>) -> MindResult<Version> {
        self.save_bump(Bump::Prerelease, engineer)
    }

    pub fn save_build(&mut self, engineer: Option<Identity>) -> MindResult<Version> {
        self.save_bump(Bump::Build, engineer)
    }

    /// All version tags, oldest first. Tags that are not versions are skipped.
    pub fn versions(&self) -> MindResult<Vec<Version>> {
        let mut versions: Vec<Version> = self
            .engine
            .list_refs(TAG_REF_PREFIX)?
            .iter()
            .filter_map(|name| {
                let parsed = parse_tag(name);
                if parsed.is_none() {
                    debug!(tag = %name, "Ignoring non-version tag");
                }
                parsed
            })
            .collect();
        versions.sort_by(newest);
        Ok(versions)
    }

    /// Newest version in history by semantic-version precedence.
    pub fn latest(&self) -> MindResult<Version> {
        self.versions()?
            .pop()
            .ok_or_else(|| MindError::NotFound("no version tags in history".to_string()))
    }

    /// Name of the checked-out variant.
    pub fn variant(&self) -> MindResult<String> {
        let head = self.engine.get_head()?;
        head.branch()
            .map(str::to_string)
            .ok_or_else(|| MindError::NotFound("HEAD is not on a variant".to_string()))
    }

    /// Switch to `name`, creating it from the current tip if it does not exist.
    ///
    /// Refuses to switch while the working tree has unsaved changes.
    pub fn set_variant(&mut self, name: &str) -> MindResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MindError::InvalidArgument(
                "variant name cannot be empty".to_string(),
            ));
        }

        let current = self.variant()?;
        if current == name {
            return Ok(());
        }
        if self.engine.is_dirty()? {
            return Err(MindError::DirtyState { variant: current });
        }

        let refname = format!("{BRANCH_PREFIX}{name}");
        if self.engine.resolve_ref(&refname)?.is_none() {
            let tip = self.tip()?;
            self.engine.create_branch(name, &tip)?;
            info!(variant = name, from = %current, "Created variant");
        }
        self.engine.set_head(&refname)?;

        info!(variant = name, "Switched variant");
        Ok(())
    }

    /// All variant names, sorted.
    pub fn variants(&self) -> MindResult<Vec<String>> {
        Ok(self
            .engine
            .list_refs(BRANCH_PREFIX)?
            .into_iter()
            .map(|r| r.trim_start_matches(BRANCH_PREFIX).to_string())
            .collect())
    }

    /// First-parent history of the current variant, newest first.
    pub fn log(&self) -> MindResult<Vec<CommitInfo>> {
        let mut entries = Vec::new();
        let mut next = self.engine.get_head()?.target;
        while let Some(id) = next {
            let info = self.engine.commit_info(&id)?;
            next = info.parents.first().cloned();
            entries.push(info);
        }
        Ok(entries)
    }

    /// Whether the working tree has unsaved changes.
    pub fn is_dirty(&self) -> MindResult<bool> {
        Ok(self.engine.is_dirty()?)
    }

    fn tip(&self) -> MindResult<ObjectId> {
        self.engine
            .get_head()?
            .target
            .ok_or_else(|| MindError::NotFound("no commit on the current variant".to_string()))
    }
}

/// Follow first parents from `tip` down to the parentless root commit.
fn root_commit<E: HistoryEngine>(engine: &E, tip: &ObjectId) -> MindResult<ObjectId> {
    let mut current = tip.clone();
    loop {
        match engine.commit_info(&current)?.parents.first() {
            Some(parent) => current = parent.clone(),
            None => return Ok(current),
        }
    }
}
