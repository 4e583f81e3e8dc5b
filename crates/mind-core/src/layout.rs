//! Canonical on-disk layout of a Mind project directory.

/// Directory holding the history object store. Part of the template, never hidden.
pub const VERSIONING_DIR: &str = "versioning";

/// Variant (branch) checked out on a freshly initialized Mind.
pub const DEFAULT_VARIANT: &str = "main";

/// Whether a template member is a directory or a placeholder file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Dir,
    File,
}

/// One entry of the canonical layout, relative to the project root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Member {
    pub name: &'static str,
    pub kind: MemberKind,
}

impl Member {
    const fn dir(name: &'static str) -> Self {
        Self {
            name,
            kind: MemberKind::Dir,
        }
    }

    const fn file(name: &'static str) -> Self {
        Self {
            name,
            kind: MemberKind::File,
        }
    }
}

/// Every member a project directory must contain, all siblings at the root.
pub const CANONICAL_MEMBERS: &[Member] = &[
    Member::dir("data"),
    Member::dir("checkpoints"),
    Member::dir(VERSIONING_DIR),
    Member::file("hyperparameters.json"),
    Member::file("training.py"),
    Member::file("initial.state_dict"),
    Member::file("dataset.py"),
    Member::file("model.py"),
];
