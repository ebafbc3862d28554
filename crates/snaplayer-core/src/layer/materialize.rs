use std::ffi::OsString;
use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use flate2::{Compression, GzBuilder};
use snaplayer_domain::{Hash, DOCKER_LAYER_GZIP};
use tar::Builder;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::tar::{append_record, DigestWriter};
use super::SnapshotLayer;
use crate::{Error, MaterializeOptions, Snapshot};

const STAGING_PREFIX: &str = ".snaplayer-";

/// Writes `snapshot` as a tar stream at `work_path` and its gzip form next to
/// it (`work_path` + compressed suffix).
///
/// Entries are written in path order. Each stage hashes the bytes as they are
/// written, so `diff_id` and `digest` describe exactly the persisted bytes.
/// Both stages write to temporary files beside `work_path`; they are renamed
/// into place only once both succeeded, so a failure leaves nothing behind.
///
/// # Errors
/// Any open, read, write or rename failure, or a regular file whose size no
/// longer matches its record.
pub fn materialize(
    snapshot: &Snapshot,
    work_path: &Path,
    options: &MaterializeOptions,
) -> Result<SnapshotLayer, Error> {
    let staging = staging_dir(work_path);
    fs::create_dir_all(staging).map_err(Error::layer_io("create layer directory", staging))?;
    let compressed_path = compressed_path_for(work_path, options.compressed_suffix());

    let (tar_temp, diff_id, tar_size) = write_tar_stage(snapshot, staging)?;
    debug!(
        snapshot = %snapshot,
        entries = snapshot.len(),
        %diff_id,
        bytes = tar_size,
        "uncompressed layer staged"
    );
    let (gz_temp, digest, compressed_size) =
        write_gzip_stage(&tar_temp, staging, options.compression_level())?;
    debug!(%digest, bytes = compressed_size, "compressed layer staged");

    tar_temp
        .persist(work_path)
        .map_err(|err| Error::LayerIo {
            action: "persist layer",
            path: work_path.to_path_buf(),
            source: err.error,
        })?;
    if let Err(err) = gz_temp.persist(&compressed_path) {
        let _ = fs::remove_file(work_path);
        return Err(Error::LayerIo {
            action: "persist compressed layer",
            path: compressed_path,
            source: err.error,
        });
    }

    info!(
        path = %work_path.display(),
        %diff_id,
        %digest,
        size = compressed_size,
        "layer materialized"
    );
    Ok(SnapshotLayer {
        tar_path: work_path.to_path_buf(),
        compressed_path,
        diff_id,
        digest,
        compressed_size,
        media_type: DOCKER_LAYER_GZIP,
    })
}

fn write_tar_stage(
    snapshot: &Snapshot,
    staging: &Path,
) -> Result<(NamedTempFile, Hash, u64), Error> {
    let temp = staging_file(staging)?;
    let temp_path = temp.path().to_path_buf();
    let mut builder = Builder::new(DigestWriter::new(BufWriter::new(temp)));
    for record in snapshot.records() {
        append_record(&mut builder, record)?;
    }
    let writer = builder
        .into_inner()
        .map_err(Error::layer_io("finish tar stream", &temp_path))?;
    let digested = writer.finish();
    let temp = digested.sink.into_inner().map_err(|err| Error::LayerIo {
        action: "flush tar stream",
        path: temp_path,
        source: err.into_error(),
    })?;
    Ok((temp, digested.hash, digested.len))
}

fn write_gzip_stage(
    tar_temp: &NamedTempFile,
    staging: &Path,
    level: u32,
) -> Result<(NamedTempFile, Hash, u64), Error> {
    let mut source = tar_temp
        .reopen()
        .map_err(Error::layer_io("reopen tar stream", tar_temp.path()))?;
    let temp = staging_file(staging)?;
    let temp_path = temp.path().to_path_buf();
    let mut encoder = GzBuilder::new().mtime(0).write(
        DigestWriter::new(BufWriter::new(temp)),
        Compression::new(level),
    );
    io::copy(&mut source, &mut encoder).map_err(Error::layer_io("compress", &temp_path))?;
    let writer = encoder
        .finish()
        .map_err(Error::layer_io("finish gzip stream", &temp_path))?;
    let digested = writer.finish();
    let temp = digested.sink.into_inner().map_err(|err| Error::LayerIo {
        action: "flush gzip stream",
        path: temp_path,
        source: err.into_error(),
    })?;
    Ok((temp, digested.hash, digested.len))
}

fn staging_file(staging: &Path) -> Result<NamedTempFile, Error> {
    tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(staging)
        .map_err(Error::layer_io("create staging file in", staging))
}

fn staging_dir(work_path: &Path) -> &Path {
    match work_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

pub(super) fn compressed_path_for(work_path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(work_path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
