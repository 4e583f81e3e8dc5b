//! Archive codec: a project directory packed into a single mind-file.
//!
//! Mind-files are zip containers. Member names are POSIX-style paths relative
//! to the project root, compressed with Deflate. Extraction refuses any member
//! whose name would land outside the destination.

use std::fs::{self, File};
use std::io::{self, BufReader, ErrorKind};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::config::{MAX_COMPRESSION_LEVEL, MIN_COMPRESSION_LEVEL};
use crate::error::{MindError, MindResult};
use crate::scratch::ScratchDir;

/// Write every regular file under `dir_root` into a mind-file at `archive_path`.
///
/// An existing archive is replaced atomically. Directories are recorded too,
/// so empty template members survive a round trip. Returns the number of
/// files written.
pub fn export(dir_root: &Path, archive_path: &Path, compression_level: i64) -> MindResult<usize> {
    if !(MIN_COMPRESSION_LEVEL..=MAX_COMPRESSION_LEVEL).contains(&compression_level) {
        return Err(MindError::InvalidArgument(format!(
            "compression level must be between {MIN_COMPRESSION_LEVEL} and {MAX_COMPRESSION_LEVEL}, got {compression_level}"
        )));
    }
    if !dir_root.is_dir() {
        return Err(MindError::missing_path(dir_root));
    }

    let parent = match archive_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let mut staging = NamedTempFile::new_in(parent)?;

    // The staging file (and the archive itself) may live inside the tree being packed.
    let excluded: Vec<PathBuf> = [staging.path(), archive_path]
        .iter()
        .filter_map(|p| p.canonicalize().ok())
        .collect();
    let check_excluded = match (parent.canonicalize(), dir_root.canonicalize()) {
        (Ok(parent), Ok(root)) => parent.starts_with(root),
        _ => false,
    };

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(compression_level));
    let zip_err = |e| MindError::from_zip(archive_path, e);

    let mut files = 0usize;
    {
        let mut writer = ZipWriter::new(staging.as_file_mut());

        for entry in WalkDir::new(dir_root).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(io::Error::other)?;
            let relative = entry
                .path()
                .strip_prefix(dir_root)
                .map_err(io::Error::other)?;
            if relative.as_os_str().is_empty() {
                continue;
            }
            let name = member_name(relative)?;
            let file_type = entry.file_type();

            if file_type.is_dir() {
                writer.add_directory(name, options).map_err(zip_err)?;
            } else if file_type.is_file() {
                if check_excluded
                    && entry
                        .path()
                        .canonicalize()
                        .map(|p| excluded.contains(&p))
                        .unwrap_or(false)
                {
                    continue;
                }
                // Zip64 headers are needed once a member passes 4 GiB.
                let size = entry.metadata().map_err(io::Error::other)?.len();
                let file_options = options.large_file(size >= u64::from(u32::MAX));
                writer.start_file(name, file_options).map_err(zip_err)?;
                let mut source = File::open(entry.path())?;
                io::copy(&mut source, &mut writer)?;
                files += 1;
            } else {
                debug!(path = %entry.path().display(), "Skipping non-regular file");
            }
        }

        writer.finish().map_err(zip_err)?;
    }

    staging.persist(archive_path).map_err(|e| e.error)?;

    info!(
        source = %dir_root.display(),
        archive = %archive_path.display(),
        files,
        "Exported mind-file"
    );
    Ok(files)
}

/// Extract a mind-file into `dest_root`, creating it if needed.
///
/// Members are unpacked into a staging directory beside `dest_root` and only
/// moved into place once every one of them has been read and checksummed, so
/// a rejected or corrupt archive leaves `dest_root` untouched. Existing files
/// with the same names are replaced. Returns the number of files written.
pub fn import(archive_path: &Path, dest_root: &Path) -> MindResult<usize> {
    let mut archive = open_archive(archive_path)?;
    let zip_err = |e| MindError::from_zip(archive_path, e);

    let mut members = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index).map_err(zip_err)?;
        let relative = safe_member_path(entry.name()).ok_or_else(|| {
            MindError::format(
                archive_path,
                format!("member '{}' resolves outside the destination", entry.name()),
            )
        })?;
        if relative.as_os_str().is_empty() {
            // Root directory entries such as "./" carry nothing to extract.
            if entry.is_dir() {
                continue;
            }
            return Err(MindError::format(archive_path, "file member with an empty name"));
        }
        members.push((index, relative, entry.is_dir()));
    }

    let parent = match dest_root.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let staging = tempfile::Builder::new()
        .prefix(".mind-import-")
        .tempdir_in(parent)?;

    let mut files = 0usize;
    for (index, relative, is_dir) in members {
        let target = staging.path().join(&relative);
        if is_dir {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut entry = archive.by_index(index).map_err(zip_err)?;
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out).map_err(|e| match e.kind() {
            ErrorKind::InvalidData => MindError::format(
                archive_path,
                format!("corrupt member '{}': {e}", relative.display()),
            ),
            _ => MindError::Io(e),
        })?;
        files += 1;
    }

    fs::create_dir_all(dest_root)?;
    move_tree(staging.path(), dest_root)?;

    info!(
        archive = %archive_path.display(),
        dest = %dest_root.display(),
        files,
        "Imported mind-file"
    );
    Ok(files)
}

/// Extract a mind-file into a scratch directory that is removed when the
/// returned handle is dropped. A failed extraction leaves nothing behind.
pub fn extract_to_ephemeral(
    archive_path: &Path,
    scratch_parent: Option<&Path>,
) -> MindResult<ScratchDir> {
    let scratch = ScratchDir::new_in(scratch_parent)?;
    import(archive_path, scratch.path())?;
    Ok(scratch)
}

/// Member names of a mind-file, in container order.
pub fn list_members(archive_path: &Path) -> MindResult<Vec<String>> {
    let mut archive = open_archive(archive_path)?;
    let mut names = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive
            .by_index_raw(index)
            .map_err(|e| MindError::from_zip(archive_path, e))?;
        names.push(entry.name().to_string());
    }
    Ok(names)
}

/// Move everything under `from` into `to`, replacing files already there.
fn move_tree(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry.path().strip_prefix(from).map_err(io::Error::other)?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::rename(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn open_archive(archive_path: &Path) -> MindResult<ZipArchive<BufReader<File>>> {
    let file = File::open(archive_path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => MindError::missing_path(archive_path),
        _ => MindError::Io(e),
    })?;
    ZipArchive::new(BufReader::new(file)).map_err(|e| MindError::from_zip(archive_path, e))
}

/// POSIX-style member name for a path relative to the project root.
fn member_name(relative: &Path) -> MindResult<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(|| {
                MindError::InvalidArgument(format!(
                    "path {} is not valid UTF-8",
                    relative.display()
                ))
            })?),
            other => {
                return Err(MindError::InvalidArgument(format!(
                    "unexpected path component {:?} in {}",
                    other,
                    relative.display()
                )))
            }
        }
    }
    Ok(parts.join("/"))
}

/// Relative path for a member name, or `None` if it could escape the destination.
///
/// Names that refer to the root itself (`"."`, `"./"`) map to an empty path.
fn safe_member_path(name: &str) -> Option<PathBuf> {
    if name.contains('\0') {
        return None;
    }
    let normalized = name.replace('\\', "/");
    if normalized.starts_with('/') {
        return None;
    }

    let mut path = PathBuf::new();
    for part in normalized.split('/') {
        match part {
            "" | "." => continue,
            ".." => return None,
            part => {
                // Rejects drive prefixes and anything else that is not a plain name.
                let mut components = Path::new(part).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => path.push(part),
                    _ => return None,
                }
            }
        }
    }

    Some(path)
}
