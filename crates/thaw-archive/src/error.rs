use std::io;
use std::path::PathBuf;

use crate::format::Codec;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid build input: {0}")]
    Configuration(String),

    #[error("failed to read '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid archive: {0}")]
    Format(#[from] FormatError),

    #[error(transparent)]
    Storage(#[from] thaw_fs::Error),
}

/// Coarse error taxonomy shared by the builder, extractor and bootstrap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad build input, e.g. a missing source directory.
    Configuration,
    /// A source file or directory could not be read.
    Io,
    /// The blob is corrupt, truncated or unsafe to extract.
    ArchiveFormat,
    /// Writing to the target filesystem failed.
    Storage,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Io { .. } => ErrorKind::Io,
            Self::Format(_) => ErrorKind::ArchiveFormat,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("archive truncated: needed {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("bad magic bytes")]
    BadMagic,

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown codec id {0}")]
    UnknownCodec(u8),

    #[error("codec '{0}' is not enabled in this build")]
    CodecDisabled(Codec),

    #[error("reserved header bytes are not zero")]
    ReservedBits,

    #[error("entry '{path}' has unknown flags {flags:#04x}")]
    UnknownFlags { path: String, flags: u8 },

    #[error("directory entry '{path}' declares {size} bytes of content")]
    DirectoryWithSize { path: String, size: u64 },

    #[error("entry path is not valid UTF-8")]
    InvalidUtf8,

    #[error("unsafe entry path '{path}': {reason}")]
    UnsafePath { path: String, reason: &'static str },

    #[error("duplicate entry path '{0}'")]
    DuplicatePath(String),

    #[error("entry '{path}' lies under file entry '{parent}'")]
    PathConflict { path: String, parent: String },

    #[error("payload digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("payload size mismatch: manifest declares {declared} bytes, payload has {actual}")]
    SizeMismatch { declared: u64, actual: u64 },

    #[error("{0} unexpected trailing bytes after payload")]
    TrailingBytes(usize),

    #[error("compression codec failed: {0}")]
    Compression(io::Error),

    #[error("archive too large: {0}")]
    TooLarge(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
