//! Directory template engine: creates and checks the canonical project layout.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

use mind_core::{Member, MemberKind, CANONICAL_MEMBERS};
use tracing::{debug, info};

use crate::error::{MindError, MindResult};

/// Create `root` and every missing canonical member.
///
/// Existing members are left untouched, so calling this on an already
/// templated directory changes nothing.
pub fn ensure_template(root: &Path) -> MindResult<()> {
    if !root.exists() {
        fs::create_dir_all(root)?;
        info!(path = %root.display(), "Created project directory");
    } else if !root.is_dir() {
        return Err(MindError::InvalidArgument(format!(
            "{} exists but is not a directory",
            root.display()
        )));
    }

    let mut created = 0usize;
    for member in CANONICAL_MEMBERS {
        if ensure_member(root, member)? {
            created += 1;
        }
    }

    if created > 0 {
        debug!(path = %root.display(), created, "Templated project directory");
    }
    Ok(())
}

/// Canonical members absent from `root` (or present with the wrong kind).
pub fn missing_members(root: &Path) -> Vec<&'static Member> {
    CANONICAL_MEMBERS
        .iter()
        .filter(|member| {
            let path = root.join(member.name);
            match member.kind {
                MemberKind::Dir => !path.is_dir(),
                MemberKind::File => !path.is_file(),
            }
        })
        .collect()
}

/// Whether `root` holds the full canonical layout.
pub fn is_templated(root: &Path) -> bool {
    root.is_dir() && missing_members(root).is_empty()
}

/// Returns true when the member had to be created.
fn ensure_member(root: &Path, member: &Member) -> MindResult<bool> {
    let path = root.join(member.name);
    match member.kind {
        MemberKind::Dir => {
            if path.is_dir() {
                return Ok(false);
            }
            if path.exists() {
                return Err(kind_mismatch(&path, "directory"));
            }
            fs::create_dir(&path)?;
            Ok(true)
        }
        MemberKind::File => {
            // create_new never truncates a file that appeared in the meantime.
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => Ok(true),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if path.is_file() {
                        Ok(false)
                    } else {
                        Err(kind_mismatch(&path, "file"))
                    }
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

fn kind_mismatch(path: &Path, expected: &str) -> MindError {
    MindError::InvalidArgument(format!(
        "template member {} exists but is not a {expected}",
        path.display()
    ))
}
