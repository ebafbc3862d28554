use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use sha2::{Digest, Sha256};
use snaplayer_domain::{FileKind, FileRecord, Hash};
use tar::{Builder, EntryType, Header};
use time::OffsetDateTime;

use crate::Error;

/// Write adapter that digests a stream as it lands on disk.
pub(super) struct DigestWriter<W> {
    sink: W,
    sha: Sha256,
    len: u64,
}

/// What a finished [`DigestWriter`] saw: the SHA-256 of every accepted byte
/// and how many there were.
pub(super) struct Digested<W> {
    pub(super) sink: W,
    pub(super) hash: Hash,
    pub(super) len: u64,
}

impl<W> DigestWriter<W> {
    pub(super) fn new(sink: W) -> Self {
        Self {
            sink,
            sha: Sha256::new(),
            len: 0,
        }
    }

    pub(super) fn finish(self) -> Digested<W> {
        Digested {
            sink: self.sink,
            hash: Hash::sha256_from_bytes(&self.sha.finalize()),
            len: self.len,
        }
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let accepted = self.sink.write(buf)?;
        self.sha.update(&buf[..accepted]);
        self.len = self
            .len
            .saturating_add(u64::try_from(accepted).unwrap_or(u64::MAX));
        Ok(accepted)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

/// Counts the body bytes handed to the tar builder for one entry.
struct CountingReader<R> {
    inner: R,
    read: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read = self
            .read
            .saturating_add(u64::try_from(n).unwrap_or(u64::MAX));
        Ok(n)
    }
}

/// Name a record is stored under: its absolute path without the leading `/`.
pub(super) fn archive_name(path: &str) -> &str {
    let trimmed = path.trim_start_matches('/');
    let trimmed = match trimmed.as_bytes() {
        [drive, b':', ..] if drive.is_ascii_alphabetic() => {
            trimmed[2..].trim_start_matches('/')
        }
        _ => trimmed,
    };
    if trimmed.is_empty() {
        "."
    } else {
        trimmed
    }
}

fn mtime_seconds(mod_time: OffsetDateTime) -> u64 {
    u64::try_from(mod_time.unix_timestamp()).unwrap_or(0)
}

pub(super) fn append_record<W: Write>(
    builder: &mut Builder<W>,
    record: &FileRecord,
) -> Result<(), Error> {
    let name = archive_name(&record.path);
    let mut header = Header::new_gnu();
    header.set_mtime(mtime_seconds(record.mod_time));
    header.set_mode(record.mode);
    header.set_uid(0);
    header.set_gid(0);
    if name.split('/').any(|component| component == "..") {
        return Err(Error::TarHeader {
            path: record.path.clone(),
            reason: "parent directory components cannot be archived",
        });
    }
    let append_error = Error::layer_io("archive", &record.path);
    match record.kind {
        FileKind::Directory => {
            header.set_entry_type(EntryType::Directory);
            header.set_size(0);
            builder
                .append_data(&mut header, Path::new(name), io::empty())
                .map_err(append_error)?;
        }
        FileKind::Symlink => {
            let target = record.link_target.as_deref().unwrap_or_default();
            header.set_entry_type(EntryType::Symlink);
            header.set_size(0);
            builder
                .append_link(&mut header, Path::new(name), Path::new(target))
                .map_err(append_error)?;
        }
        FileKind::RegularFile => {
            let file = File::open(&record.path)
                .map_err(Error::layer_io("open source file", &record.path))?;
            let found = file
                .metadata()
                .map_err(Error::layer_io("stat source file", &record.path))?
                .len();
            if found != record.size {
                return Err(Error::ContentChanged {
                    path: record.path.clone(),
                    expected: record.size,
                    found,
                });
            }
            header.set_entry_type(EntryType::Regular);
            header.set_size(record.size);
            append_body(builder, &mut header, name, record, file)?;
        }
    }
    Ok(())
}

/// Streams exactly `record.size` bytes of `source` as the entry body.
///
/// The tar builder pads a short body silently, so the bytes actually read are
/// counted and any shortfall or surplus fails with [`Error::ContentChanged`].
pub(super) fn append_body<W: Write, R: Read>(
    builder: &mut Builder<W>,
    header: &mut Header,
    name: &str,
    record: &FileRecord,
    source: R,
) -> Result<(), Error> {
    let mut body = CountingReader {
        inner: source.take(record.size),
        read: 0,
    };
    builder
        .append_data(header, Path::new(name), &mut body)
        .map_err(Error::layer_io("archive", &record.path))?;
    let surplus = io::copy(&mut body.inner.into_inner(), &mut io::sink())
        .map_err(Error::layer_io("read source file", &record.path))?;
    if body.read != record.size || surplus != 0 {
        return Err(Error::ContentChanged {
            path: record.path.clone(),
            expected: record.size,
            found: body.read.saturating_add(surplus),
        });
    }
    Ok(())
}
