use std::fs::{self, Metadata};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use snaplayer_domain::record::normalize_separators;
use time::OffsetDateTime;
use tracing::{debug, info, trace};
use walkdir::WalkDir;

use crate::{Error, FileRecord, Snapshot};

/// Captures every node under `root`, `root` included.
///
/// Symlinks are recorded but never descended into. A node counts as a symlink
/// when its absolute path differs from its fully resolved form, so a link to a
/// directory is recorded as a link, not as a directory.
///
/// # Errors
/// Any unreadable node or unresolvable symlink aborts the walk.
pub fn walk(root: &Path) -> Result<Snapshot, Error> {
    let started = Instant::now();
    let root = absolute_clean(root)?;
    let root_name = utf8_path(&root)?;
    let mut records = Vec::new();
    for entry in WalkDir::new(&root)
        .follow_links(false)
        .follow_root_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| Error::Walk {
            path: source.path().map_or_else(|| root.clone(), Path::to_path_buf),
            source,
        })?;
        let path = entry.path();
        let metadata = entry.metadata().map_err(|source| Error::Walk {
            path: path.to_path_buf(),
            source,
        })?;
        let file_type = metadata.file_type();
        if !(file_type.is_dir() || file_type.is_file() || file_type.is_symlink()) {
            debug!(path = %path.display(), "skipping special file during snapshot");
            continue;
        }
        let record = describe(path, &metadata)?;
        trace!(path = %record.path, kind = record.kind.as_str(), size = record.size, "recorded");
        records.push(record);
    }
    let snapshot = Snapshot::new(normalize_separators(&root_name), records);
    info!(
        root = %root.display(),
        entries = snapshot.len(),
        bytes = snapshot.content_bytes(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "snapshot captured"
    );
    Ok(snapshot)
}

fn describe(path: &Path, metadata: &Metadata) -> Result<FileRecord, Error> {
    let raw = normalize_separators(&utf8_path(path)?);
    let resolved = fs::canonicalize(path).map_err(|source| Error::ResolveSymlink {
        path: path.to_path_buf(),
        source,
    })?;
    let resolved = normalize_separators(&utf8_path(&resolved)?);
    let mod_time = metadata
        .modified()
        .map(OffsetDateTime::from)
        .map_err(|source| Error::Metadata {
            path: path.to_path_buf(),
            source,
        })?;
    let mode = permission_bits(metadata);
    let record = if resolved != raw {
        FileRecord::symlink(raw, resolved, mod_time, mode)
    } else if metadata.is_dir() {
        FileRecord::directory(raw, mod_time, mode)
    } else {
        FileRecord::regular_file(raw, metadata.len(), mod_time, mode)
    };
    Ok(record)
}

/// Absolute form of `path` with `.` and `..` folded lexically. Symlinks are
/// left unresolved.
fn absolute_clean(path: &Path) -> Result<PathBuf, Error> {
    let absolute = std::path::absolute(path).map_err(|source| Error::Absolutize {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    Ok(cleaned)
}

fn utf8_path(path: &Path) -> Result<String, Error> {
    path.to_str()
        .map(ToOwned::to_owned)
        .ok_or_else(|| Error::NonUtf8Path {
            path: path.to_path_buf(),
        })
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata) -> u32 {
    if metadata.is_dir() {
        0o755
    } else if metadata.file_type().is_symlink() {
        0o777
    } else if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
