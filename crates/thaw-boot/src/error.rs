use std::path::PathBuf;

use thaw_archive::ErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("extraction failed: {0}")]
    Extract(#[from] thaw_archive::Error),

    #[error("archive entry '{entry}' would overwrite the marker '{}'", marker.display())]
    MarkerCollision { entry: String, marker: PathBuf },

    #[error("failed to write marker: {0}")]
    Marker(#[source] thaw_fs::Error),
}

impl Error {
    /// `ArchiveFormat` for corrupt or unusable blobs, `Storage` for write
    /// failures.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Extract(e) => e.kind(),
            Self::MarkerCollision { .. } => ErrorKind::ArchiveFormat,
            Self::Marker(_) => ErrorKind::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
