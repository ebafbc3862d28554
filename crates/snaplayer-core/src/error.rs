use std::io;
use std::path::PathBuf;

/// Errors surfaced by walking, diffing and materializing snapshots.
///
/// Every variant aborts the operation that raised it; nothing partial is
/// returned alongside an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("[SL101] cannot make {} absolute", path.display())]
    Absolutize { path: PathBuf, source: io::Error },
    #[error("[SL102] path {} is not valid UTF-8", path.display())]
    NonUtf8Path { path: PathBuf },
    #[error("[SL103] failed to walk {}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("[SL104] failed to read metadata for {}", path.display())]
    Metadata { path: PathBuf, source: io::Error },
    #[error("[SL105] failed to resolve symlinks for {}", path.display())]
    ResolveSymlink { path: PathBuf, source: io::Error },
    #[error("[SL201] failed to {action} {}", path.display())]
    LayerIo {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    #[error("[SL202] cannot store {path} in a tar header: {reason}")]
    TarHeader { path: String, reason: &'static str },
    #[error("[SL203] {path} changed since the snapshot was taken (expected {expected} bytes, found {found})")]
    ContentChanged {
        path: String,
        expected: u64,
        found: u64,
    },
    #[error("[SL301] invalid {key} value '{value}': {reason}")]
    Config {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Error {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Absolutize { .. } => "SL101",
            Self::NonUtf8Path { .. } => "SL102",
            Self::Walk { .. } => "SL103",
            Self::Metadata { .. } => "SL104",
            Self::ResolveSymlink { .. } => "SL105",
            Self::LayerIo { .. } => "SL201",
            Self::TarHeader { .. } => "SL202",
            Self::ContentChanged { .. } => "SL203",
            Self::Config { .. } => "SL301",
        }
    }

    /// Path errors are failures to name a node; everything else is I/O or
    /// configuration.
    #[must_use]
    pub fn is_path_error(&self) -> bool {
        matches!(
            self,
            Self::Absolutize { .. } | Self::NonUtf8Path { .. } | Self::TarHeader { .. }
        )
    }

    pub(crate) fn layer_io(
        action: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::LayerIo {
            action,
            path,
            source,
        }
    }
}
