//! `git2` implementation of [`HistoryEngine`].

use std::fs;
use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{
    Commit, ErrorCode, IndexAddOption, Oid, Repository, RepositoryInitOptions, Signature,
    StatusOptions,
};
use mind_core::{Identity, DEFAULT_VARIANT, VERSIONING_DIR};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::{CommitInfo, Head, HistoryEngine, ObjectId, TAG_REF_PREFIX};

/// Ignore rule keeping the object store out of its own snapshots.
const STORE_EXCLUDE: &str = "/versioning/";

/// Filesystem-backed history whose object store lives in `<root>/versioning`.
pub struct GitBackend {
    repo: Repository,
    root: PathBuf,
}

impl GitBackend {
    /// Location of the object store for a project root.
    pub fn store_path(root: &Path) -> PathBuf {
        root.join(VERSIONING_DIR)
    }

    /// Whether an object store has been initialized under `root`.
    pub fn exists(root: &Path) -> bool {
        Self::store_path(root).join("HEAD").is_file()
    }

    /// Initialize a fresh object store bound to `root` as working tree.
    ///
    /// `HEAD` points at the unborn default variant; no commit is written.
    pub fn init(root: &Path) -> EngineResult<Self> {
        let root = root.canonicalize()?;
        let store = Self::store_path(&root);

        let mut opts = RepositoryInitOptions::new();
        opts.bare(true)
            .mkdir(true)
            .no_reinit(true)
            .initial_head(DEFAULT_VARIANT);
        let repo = Repository::init_opts(&store, &opts)?;

        // Initialized bare so no `.git` is created; the working tree is the
        // parent directory from here on.
        repo.config()?.set_bool("core.bare", false)?;
        repo.set_workdir(&root, false)?;
        write_store_exclude(&store)?;

        info!(store = %store.display(), "Initialized history store");
        Ok(Self { repo, root })
    }

    /// Open the object store under `root`.
    pub fn open(root: &Path) -> EngineResult<Self> {
        let root = root.canonicalize()?;
        let store = Self::store_path(&root);
        if !Self::exists(&root) {
            return Err(EngineError::StoreNotFound { path: store });
        }

        let repo = Repository::open(&store)?;
        // The project may have moved (e.g. extracted from an archive), so the
        // working tree is always re-bound to where it lives now.
        repo.set_workdir(&root, false)?;
        write_store_exclude(&store)?;

        debug!(store = %store.display(), "Opened history store");
        Ok(Self { repo, root })
    }

    /// Project root used as the working tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn find_commit(&self, id: &ObjectId) -> EngineResult<Commit<'_>> {
        Ok(self.repo.find_commit(to_oid(id)?)?)
    }
}

impl HistoryEngine for GitBackend {
    fn stage_all_and_write_tree(&mut self) -> EngineResult<ObjectId> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        let tree = index.write_tree()?;
        debug!(tree = %tree, "Staged working tree");
        Ok(from_oid(tree))
    }

    fn create_commit(
        &mut self,
        parents: &[ObjectId],
        tree: &ObjectId,
        author: &Identity,
        committer: &Identity,
        message: &str,
    ) -> EngineResult<ObjectId> {
        let tree = self.repo.find_tree(to_oid(tree)?)?;
        let mut parent_commits = Vec::with_capacity(parents.len());
        for parent in parents {
            parent_commits.push(self.find_commit(parent)?);
        }
        let parent_refs: Vec<&Commit<'_>> = parent_commits.iter().collect();

        let id = self.repo.commit(
            None,
            &signature(author)?,
            &signature(committer)?,
            message,
            &tree,
            &parent_refs,
        )?;
        Ok(from_oid(id))
    }

    fn create_tag(
        &mut self,
        name: &str,
        target: &ObjectId,
        tagger: &Identity,
        message: &str,
    ) -> EngineResult<ObjectId> {
        let refname = format!("{TAG_REF_PREFIX}{name}");
        if self.repo.find_reference(&refname).is_ok() {
            return Err(EngineError::RefExists(refname));
        }

        let object = self.repo.find_object(to_oid(target)?, None)?;
        let id = self
            .repo
            .tag(name, &object, &signature(tagger)?, message, false)?;
        Ok(from_oid(id))
    }

    fn delete_tag(&mut self, name: &str) -> EngineResult<()> {
        self.repo.tag_delete(name)?;
        Ok(())
    }

    fn list_refs(&self, prefix: &str) -> EngineResult<Vec<String>> {
        let mut names = Vec::new();
        for reference in self.repo.references()? {
            let reference = reference?;
            if let Some(name) = reference.name() {
                if name.starts_with(prefix) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn resolve_ref(&self, refname: &str) -> EngineResult<Option<ObjectId>> {
        match self.repo.find_reference(refname) {
            Ok(reference) => Ok(Some(from_oid(reference.peel_to_commit()?.id()))),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn get_head(&self) -> EngineResult<Head> {
        let head = self.repo.find_reference("HEAD")?;
        let refname = head.symbolic_target().map(str::to_string);
        let target = match &refname {
            Some(name) => self.resolve_ref(name)?,
            None => head.target().map(from_oid),
        };
        Ok(Head { refname, target })
    }

    fn set_head(&mut self, refname: &str) -> EngineResult<()> {
        let target = self
            .resolve_ref(refname)?
            .ok_or_else(|| EngineError::ObjectNotFound(refname.to_string()))?;
        let commit = self.find_commit(&target)?;

        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut checkout))?;
        self.repo.set_head(refname)?;

        info!(head = refname, "Checked out");
        Ok(())
    }

    fn update_head(&mut self, commit: &ObjectId) -> EngineResult<()> {
        let oid = to_oid(commit)?;
        let symbolic = self
            .repo
            .find_reference("HEAD")?
            .symbolic_target()
            .map(str::to_string);

        match symbolic {
            Some(branch) => {
                self.repo
                    .reference(&branch, oid, true, &format!("mind: advance to {oid}"))?;
            }
            None => self.repo.set_head_detached(oid)?,
        }
        Ok(())
    }

    fn create_branch(&mut self, name: &str, from: &ObjectId) -> EngineResult<()> {
        let commit = self.find_commit(from)?;
        match self.repo.branch(name, &commit, false) {
            Ok(_) => Ok(()),
            Err(e) if e.code() == ErrorCode::Exists => {
                Err(EngineError::RefExists(format!("refs/heads/{name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn commit_info(&self, commit: &ObjectId) -> EngineResult<CommitInfo> {
        let c = self.find_commit(commit)?;
        let info = CommitInfo {
            id: from_oid(c.id()),
            tree: from_oid(c.tree_id()),
            parents: c.parent_ids().map(from_oid).collect(),
            author: identity(&c.author()),
            committer: identity(&c.committer()),
            message: c.message().unwrap_or_default().to_string(),
            time: c.time().seconds(),
        };
        Ok(info)
    }

    fn is_dirty(&self) -> EngineResult<bool> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .exclude_submodules(true);
        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(!statuses.is_empty())
    }
}

fn to_oid(id: &ObjectId) -> EngineResult<Oid> {
    Oid::from_str(id.as_str()).map_err(|_| EngineError::ObjectNotFound(id.to_string()))
}

fn from_oid(oid: Oid) -> ObjectId {
    ObjectId(oid.to_string())
}

fn signature(identity: &Identity) -> EngineResult<Signature<'static>> {
    Ok(Signature::now(&identity.name, &identity.email)?)
}

fn identity(signature: &Signature<'_>) -> Identity {
    Identity::with_email(
        signature.name().unwrap_or_default(),
        signature.email().unwrap_or_default(),
    )
}

/// Make sure the store's `info/exclude` hides the store from the working tree.
fn write_store_exclude(store: &Path) -> std::io::Result<()> {
    let info = store.join("info");
    fs::create_dir_all(&info)?;
    let exclude = info.join("exclude");

    let current = match fs::read_to_string(&exclude) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };
    if current.lines().any(|line| line.trim() == STORE_EXCLUDE) {
        return Ok(());
    }

    let mut updated = current;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(STORE_EXCLUDE);
    updated.push('\n');
    fs::write(&exclude, updated)
}
