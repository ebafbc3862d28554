use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Entry types a snapshot can record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    Directory,
    RegularFile,
    Symlink,
}

impl FileKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::RegularFile => "regular-file",
            Self::Symlink => "symlink",
        }
    }
}

/// Metadata captured for one filesystem node.
///
/// Paths are absolute and always use `/` as separator. `link_target` is only
/// ever set for [`FileKind::Symlink`] records, and directories and symlinks
/// always report a size of zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub kind: FileKind,
    pub size: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub mod_time: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_target: Option<String>,
    pub mode: u32,
}

impl FileRecord {
    pub fn directory(path: impl AsRef<str>, mod_time: OffsetDateTime, mode: u32) -> Self {
        Self {
            path: normalize_separators(path.as_ref()),
            kind: FileKind::Directory,
            size: 0,
            mod_time,
            link_target: None,
            mode,
        }
    }

    pub fn regular_file(
        path: impl AsRef<str>,
        size: u64,
        mod_time: OffsetDateTime,
        mode: u32,
    ) -> Self {
        Self {
            path: normalize_separators(path.as_ref()),
            kind: FileKind::RegularFile,
            size,
            mod_time,
            link_target: None,
            mode,
        }
    }

    pub fn symlink(
        path: impl AsRef<str>,
        target: impl AsRef<str>,
        mod_time: OffsetDateTime,
        mode: u32,
    ) -> Self {
        Self {
            path: normalize_separators(path.as_ref()),
            kind: FileKind::Symlink,
            size: 0,
            mod_time,
            link_target: Some(normalize_separators(target.as_ref())),
            mode,
        }
    }

    /// True when `self` should be considered modified relative to `previous`.
    ///
    /// Only size and modification instant are compared; contents never are.
    pub fn differs_from(&self, previous: &FileRecord) -> bool {
        self.size != previous.size || self.mod_time != previous.mod_time
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }

    /// Checks that paths are absolute and that kind, target and size pair up
    /// the way a walked record would.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.path.contains('\\') {
            anyhow::bail!("record path {} contains a backslash", self.path);
        }
        if !is_absolute(&self.path) {
            anyhow::bail!("record path {} is not absolute", self.path);
        }
        if let Some(target) = self.link_target.as_deref() {
            if !is_absolute(target) {
                anyhow::bail!("symlink {} points at relative target {target}", self.path);
            }
        }
        match (self.kind, self.link_target.is_some()) {
            (FileKind::Symlink, false) => {
                anyhow::bail!("symlink record {} has no link target", self.path)
            }
            (FileKind::Directory | FileKind::RegularFile, true) => anyhow::bail!(
                "{} record {} carries a link target",
                self.kind.as_str(),
                self.path
            ),
            _ => {}
        }
        if self.size != 0 && self.kind != FileKind::RegularFile {
            anyhow::bail!(
                "{} record {} must have size 0 (found {})",
                self.kind.as_str(),
                self.path,
                self.size
            );
        }
        Ok(())
    }
}

pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// `/`-rooted, or a drive letter followed by `:/`.
fn is_absolute(path: &str) -> bool {
    match path.as_bytes() {
        [b'/', ..] => true,
        [drive, b':', b'/', ..] => drive.is_ascii_alphabetic(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn constructors_normalize_backslashes() {
        let record = FileRecord::symlink(
            r"C:\data\link",
            r"C:\data\target",
            datetime!(2024-01-01 0:00 UTC),
            0o777,
        );
        assert_eq!(record.path, "C:/data/link");
        assert_eq!(record.link_target.as_deref(), Some("C:/data/target"));
        assert_eq!(record.size, 0);
        record.validate().expect("valid symlink record");
    }

    #[test]
    fn differs_from_compares_instants_not_offsets() {
        let utc = FileRecord::regular_file("/a", 5, datetime!(2024-03-01 12:00 UTC), 0o644);
        let shifted =
            FileRecord::regular_file("/a", 5, datetime!(2024-03-01 14:00 +2), 0o600);
        assert!(!shifted.differs_from(&utc));

        let resized = FileRecord::regular_file("/a", 6, datetime!(2024-03-01 12:00 UTC), 0o644);
        assert!(resized.differs_from(&utc));
    }

    #[test]
    fn validate_rejects_target_on_regular_file() {
        let mut record = FileRecord::regular_file("/a", 1, OffsetDateTime::UNIX_EPOCH, 0o644);
        record.link_target = Some("/b".into());
        assert!(record.validate().is_err());
    }

    #[test]
    fn validate_requires_absolute_paths() {
        let relative = FileRecord::regular_file("tree/a.txt", 1, OffsetDateTime::UNIX_EPOCH, 0o644);
        let err = relative.validate().expect_err("relative path");
        assert!(err.to_string().contains("not absolute"), "{err}");

        let drive = FileRecord::directory(r"D:\tree", OffsetDateTime::UNIX_EPOCH, 0o755);
        drive.validate().expect("drive-rooted path");

        let link = FileRecord::symlink("/tree/l", "../target", OffsetDateTime::UNIX_EPOCH, 0o777);
        assert!(link.validate().is_err());
    }
}
