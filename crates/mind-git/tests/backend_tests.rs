//! Integration tests for the git2-backed history engine.
//!
//! Run with: `cargo test --package mind-git --test backend_tests`

use std::fs;
use std::path::Path;

use mind_core::Identity;
use mind_git::{EngineError, GitBackend, HistoryEngine, BRANCH_PREFIX, TAG_REF_PREFIX};
use tempfile::TempDir;

fn project(dir: &Path) {
    fs::create_dir_all(dir.join("versioning")).unwrap();
    fs::write(dir.join("model.py"), "").unwrap();
    fs::write(dir.join("training.py"), "").unwrap();
}

fn owner() -> Identity {
    Identity::new("owner")
}

/// Write a root commit and publish it on HEAD.
fn root_commit(engine: &mut GitBackend) -> mind_git::ObjectId {
    let tree = engine.stage_all_and_write_tree().unwrap();
    let commit = engine
        .create_commit(&[], &tree, &owner(), &owner(), "Base Template")
        .unwrap();
    engine.update_head(&commit).unwrap();
    commit
}

#[test]
fn test_init_creates_store_in_versioning() {
    let temp = TempDir::new().unwrap();
    project(temp.path());

    assert!(!GitBackend::exists(temp.path()));
    let engine = GitBackend::init(temp.path()).unwrap();

    assert!(GitBackend::exists(temp.path()));
    assert!(!temp.path().join(".git").exists());

    let head = engine.get_head().unwrap();
    assert_eq!(head.branch(), Some("main"));
    assert_eq!(head.target, None);
}

#[test]
fn test_open_missing_store_fails() {
    let temp = TempDir::new().unwrap();
    project(temp.path());

    assert!(matches!(
        GitBackend::open(temp.path()),
        Err(EngineError::StoreNotFound { .. })
    ));
}

#[test]
fn test_store_is_not_part_of_snapshots() {
    let temp = TempDir::new().unwrap();
    project(temp.path());
    let mut engine = GitBackend::init(temp.path()).unwrap();
    root_commit(&mut engine);

    // Writing objects must not make the tree look dirty.
    assert!(!engine.is_dirty().unwrap());
}

#[test]
fn test_commit_tag_and_list() {
    let temp = TempDir::new().unwrap();
    project(temp.path());
    let mut engine = GitBackend::init(temp.path()).unwrap();
    let base = root_commit(&mut engine);

    engine
        .create_tag("v0.0.0", &base, &owner(), "Base Template")
        .unwrap();

    fs::write(temp.path().join("model.py"), "layers = 3").unwrap();
    assert!(engine.is_dirty().unwrap());

    let tree = engine.stage_all_and_write_tree().unwrap();
    let engineer = Identity::with_email("Eng", "eng@example.com");
    let next = engine
        .create_commit(&[base.clone()], &tree, &owner(), &engineer, "Version 0.0.1")
        .unwrap();
    engine
        .create_tag("v0.0.1", &next, &owner(), "Version 0.0.1")
        .unwrap();
    engine.update_head(&next).unwrap();

    assert!(!engine.is_dirty().unwrap());
    assert_eq!(engine.get_head().unwrap().target, Some(next.clone()));
    assert_eq!(
        engine.list_refs(TAG_REF_PREFIX).unwrap(),
        vec!["refs/tags/v0.0.0", "refs/tags/v0.0.1"]
    );
    assert_eq!(
        engine.resolve_ref("refs/tags/v0.0.1").unwrap(),
        Some(next.clone())
    );
    assert_eq!(engine.resolve_ref("refs/tags/v9.9.9").unwrap(), None);

    let info = engine.commit_info(&next).unwrap();
    assert_eq!(info.parents, vec![base]);
    assert_eq!(info.author, owner());
    assert_eq!(info.committer, engineer);
    assert_eq!(info.message, "Version 0.0.1");
}

#[test]
fn test_duplicate_tag_is_rejected() {
    let temp = TempDir::new().unwrap();
    project(temp.path());
    let mut engine = GitBackend::init(temp.path()).unwrap();
    let base = root_commit(&mut engine);

    engine.create_tag("v0.0.0", &base, &owner(), "first").unwrap();
    assert!(matches!(
        engine.create_tag("v0.0.0", &base, &owner(), "second"),
        Err(EngineError::RefExists(_))
    ));

    engine.delete_tag("v0.0.0").unwrap();
    assert!(engine.list_refs(TAG_REF_PREFIX).unwrap().is_empty());
}

#[test]
fn test_branch_switch_checks_out_files() {
    let temp = TempDir::new().unwrap();
    project(temp.path());
    let mut engine = GitBackend::init(temp.path()).unwrap();
    let base = root_commit(&mut engine);

    engine.create_branch("experiment", &base).unwrap();
    engine
        .set_head(&format!("{BRANCH_PREFIX}experiment"))
        .unwrap();
    assert_eq!(engine.get_head().unwrap().branch(), Some("experiment"));

    fs::write(temp.path().join("model.py"), "experimental").unwrap();
    let tree = engine.stage_all_and_write_tree().unwrap();
    let commit = engine
        .create_commit(&[base], &tree, &owner(), &owner(), "try")
        .unwrap();
    engine.update_head(&commit).unwrap();

    engine.set_head(&format!("{BRANCH_PREFIX}main")).unwrap();
    assert_eq!(
        fs::read_to_string(temp.path().join("model.py")).unwrap(),
        ""
    );

    assert_eq!(
        engine.list_refs(BRANCH_PREFIX).unwrap(),
        vec!["refs/heads/experiment", "refs/heads/main"]
    );
}

#[test]
fn test_reopen_rebinds_moved_project() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("first");
    project(&first);
    let base = {
        let mut engine = GitBackend::init(&first).unwrap();
        root_commit(&mut engine)
    };

    let moved = temp.path().join("moved");
    fs::rename(&first, &moved).unwrap();

    let engine = GitBackend::open(&moved).unwrap();
    assert_eq!(engine.get_head().unwrap().target, Some(base));
    assert!(!engine.is_dirty().unwrap());
}
