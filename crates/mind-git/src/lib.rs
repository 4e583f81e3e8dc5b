//! History engine behind Mind version control.
//!
//! [`HistoryEngine`] is the narrow commit/tag/ref contract the version-control
//! facade is written against. [`GitBackend`] implements it with `git2`, keeping
//! the object database in the project's `versioning/` member while the project
//! root itself is the working tree.

mod backend;
mod error;

use std::fmt;

use mind_core::Identity;
use serde::{Deserialize, Serialize};

pub use backend::GitBackend;
pub use error::{EngineError, EngineResult};

/// Namespace holding variant (branch) refs.
pub const BRANCH_PREFIX: &str = "refs/heads/";

/// Namespace holding tag refs.
pub const TAG_REF_PREFIX: &str = "refs/tags/";

/// Hex id of a commit, tree or tag object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub String);

impl ObjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form used in log output.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where `HEAD` currently points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    /// Full ref name when `HEAD` is symbolic (`refs/heads/main`), `None` when detached.
    pub refname: Option<String>,
    /// Commit at the tip, `None` while the branch is unborn.
    pub target: Option<ObjectId>,
}

impl Head {
    /// Short branch name, e.g. `main`.
    pub fn branch(&self) -> Option<&str> {
        self.refname
            .as_deref()
            .map(|r| r.strip_prefix(BRANCH_PREFIX).unwrap_or(r))
    }
}

/// A commit as read back from history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub id: ObjectId,
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: Identity,
    pub committer: Identity,
    pub message: String,
    /// Commit time in seconds since the Unix epoch.
    pub time: i64,
}

/// Commit/tag/ref operations the version-control facade relies on.
///
/// Commits are written as plain objects; nothing moves until [`update_head`]
/// is called, so a caller can tag a commit before publishing it on a branch.
///
/// [`update_head`]: HistoryEngine::update_head
pub trait HistoryEngine {
    /// Stage the full working tree (additions, modifications, deletions) and
    /// write the index as a tree object.
    fn stage_all_and_write_tree(&mut self) -> EngineResult<ObjectId>;

    /// Write a commit object. Does not move any ref.
    fn create_commit(
        &mut self,
        parents: &[ObjectId],
        tree: &ObjectId,
        author: &Identity,
        committer: &Identity,
        message: &str,
    ) -> EngineResult<ObjectId>;

    /// Create an annotated tag `name` pointing at `target`. Fails if it exists.
    fn create_tag(
        &mut self,
        name: &str,
        target: &ObjectId,
        tagger: &Identity,
        message: &str,
    ) -> EngineResult<ObjectId>;

    /// Remove a tag by short name.
    fn delete_tag(&mut self, name: &str) -> EngineResult<()>;

    /// Full names of all refs starting with `prefix`, sorted.
    fn list_refs(&self, prefix: &str) -> EngineResult<Vec<String>>;

    /// Commit a ref ultimately points at, if the ref exists.
    fn resolve_ref(&self, refname: &str) -> EngineResult<Option<ObjectId>>;

    fn get_head(&self) -> EngineResult<Head>;

    /// Check out `refname` and point `HEAD` at it.
    fn set_head(&mut self, refname: &str) -> EngineResult<()>;

    /// Move the ref `HEAD` points at (or `HEAD` itself when detached) to `commit`.
    fn update_head(&mut self, commit: &ObjectId) -> EngineResult<()>;

    /// Create branch `name` at `from`. Fails if it exists.
    fn create_branch(&mut self, name: &str, from: &ObjectId) -> EngineResult<()>;

    fn commit_info(&self, commit: &ObjectId) -> EngineResult<CommitInfo>;

    /// Whether the working tree differs from the checked-out commit.
    fn is_dirty(&self) -> EngineResult<bool>;
}
