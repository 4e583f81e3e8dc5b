//! Commands that open a Mind and work with its history.

use anyhow::Result;
use mind_core::{Bump, Identity};
use mind_git::CommitInfo;
use mind_ops::{Config, Mind, MindSource};
use serde::Serialize;
use tracing::debug;

/// Open the Mind described by `source`, owned by the configured owner.
fn open(config: &Config, source: &MindSource) -> Result<Mind> {
    let owner = config.owner_identity()?;
    debug!(owner = %owner, "Opening mind");
    Ok(Mind::open_with(source, owner, config)?)
}

/// Write an ephemeral Mind back to its mind-file so changes survive.
fn persist(mind: &mut Mind) -> Result<()> {
    if mind.is_ephemeral() {
        let archive = mind.export(None)?;
        println!("📦 Updated {}", archive);
    }
    Ok(())
}

/// Create or open a Mind and report where it lives.
pub fn init(config: &Config, source: &MindSource) -> Result<()> {
    let mind = open(config, source)?;

    println!("✅ Mind ready at {}", mind.root().display());
    if let Some(archive) = mind.archive() {
        println!("📦 Mind-file:  {}", archive);
    }
    println!("🏷️  Version:    {}", mind.latest()?);

    mind.close()?;
    Ok(())
}

/// Save the working tree as the next version.
pub fn save(
    config: &Config,
    source: &MindSource,
    bump: Bump,
    engineer: Option<Identity>,
) -> Result<()> {
    let mut mind = open(config, source)?;
    let version = mind.save_bump(bump, engineer)?;

    println!(
        "✅ Saved version {} on variant '{}' by {}",
        version,
        mind.variant()?,
        mind.last_engineer()
    );

    persist(&mut mind)?;
    mind.close()?;
    Ok(())
}

pub fn latest(config: &Config, source: &MindSource) -> Result<()> {
    let mind = open(config, source)?;
    println!("{}", mind.latest()?);
    mind.close()?;
    Ok(())
}

/// List saved versions, oldest first.
pub fn versions(config: &Config, source: &MindSource, json: bool) -> Result<()> {
    let mind = open(config, source)?;
    let versions = mind.versions()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
    } else {
        for version in &versions {
            println!("{}", version);
        }
    }

    mind.close()?;
    Ok(())
}

/// Show the history of the current variant.
pub fn log(config: &Config, source: &MindSource, json: bool) -> Result<()> {
    let mind = open(config, source)?;
    let commits = mind.log()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&commits)?);
    } else {
        for commit in &commits {
            print_commit(commit);
        }
    }

    mind.close()?;
    Ok(())
}

fn print_commit(commit: &CommitInfo) {
    if commit.author == commit.committer {
        println!("{} {} ({})", commit.id.short(), commit.message, commit.author);
    } else {
        println!(
            "{} {} ({}, owner {})",
            commit.id.short(),
            commit.message,
            commit.committer,
            commit.author
        );
    }
}

/// Print the current variant, or switch to `name`.
pub fn variant(config: &Config, source: &MindSource, name: Option<&str>) -> Result<()> {
    let mut mind = open(config, source)?;

    match name {
        Some(name) => {
            mind.set_variant(name)?;
            println!("🔀 Switched to variant '{}'", name);
            persist(&mut mind)?;
        }
        None => {
            let current = mind.variant()?;
            for variant in mind.variants()? {
                let marker = if variant == current { "*" } else { " " };
                println!("{} {}", marker, variant);
            }
        }
    }

    mind.close()?;
    Ok(())
}

/// Summary shown by `mind status`.
#[derive(Debug, Serialize)]
struct StatusReport {
    root: String,
    ephemeral: bool,
    archive: Option<String>,
    archive_size: Option<u64>,
    variant: String,
    latest: String,
    versions: usize,
    files: usize,
    owner: String,
    last_engineer: String,
    dirty: bool,
}

/// Show where the Mind lives and the state of its history.
pub fn status(config: &Config, source: &MindSource, json: bool) -> Result<()> {
    let mind = open(config, source)?;

    let archive_size = match mind.archive() {
        Some(archive) if archive.exists() => Some(archive.size()?),
        _ => None,
    };
    let report = StatusReport {
        root: mind.root().display().to_string(),
        ephemeral: mind.is_ephemeral(),
        archive: mind.archive().map(|a| a.to_string()),
        archive_size,
        variant: mind.variant()?,
        latest: mind.latest()?.to_string(),
        versions: mind.versions()?.len(),
        files: mind.files()?.len(),
        owner: mind.owner().to_string(),
        last_engineer: mind.last_engineer().to_string(),
        dirty: mind.is_dirty()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        mind.close()?;
        return Ok(());
    }

    println!("📊 Mind Status");
    println!("{:─<50}", "");
    println!();
    println!("📍 Path:       {}", report.root);
    if report.ephemeral {
        println!("⏳ Mode:       ephemeral (removed on exit)");
    }
    if let Some(archive) = &report.archive {
        let size = report
            .archive_size
            .map(|s| humansize::format_size(s, humansize::DECIMAL))
            .unwrap_or_else(|| "not written".to_string());
        println!("📦 Mind-file:  {} ({})", archive, size);
    }
    println!("🔀 Variant:    {}", report.variant);
    println!("🏷️  Latest:     {} ({} versions)", report.latest, report.versions);
    println!("📄 Files:      {}", report.files);
    println!("👤 Owner:      {}", report.owner);
    println!("🛠️  Engineer:   {}", report.last_engineer);
    println!(
        "✏️  Changes:    {}",
        if report.dirty { "unsaved" } else { "none" }
    );

    mind.close()?;
    Ok(())
}
