use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to create directory '{path}': {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to set permissions on '{path}': {source}")]
    Permissions { path: PathBuf, source: io::Error },
}

impl Error {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Write { path, .. }
            | Self::Read { path, .. }
            | Self::CreateDir { path, .. }
            | Self::Permissions { path, .. } => path,
        }
    }

    pub fn io_error(&self) -> &io::Error {
        match self {
            Self::Write { source, .. }
            | Self::Read { source, .. }
            | Self::CreateDir { source, .. }
            | Self::Permissions { source, .. } => source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
