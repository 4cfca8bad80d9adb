//! Self-describing archive blobs for frozen example trees.
//!
//! # Architecture
//!
//! - `format.rs` - Blob header layout and compression codecs
//! - `entry.rs` - Manifest entries and their flag encoding
//! - `archive.rs` - Blob writer and validating reader
//! - `build.rs` - Directory walker that produces deterministic blobs
//! - `sanitize.rs` - Entry path validation (zip-slip prevention)
//! - `extract/` - Extraction pipeline and the filesystem `Target` seam

pub use archive::{Archive, ArchiveWriter, Header};
pub use build::{BuildOptions, BuildReport, Bundle, build_archive, build_archive_to};
pub use entry::{Entry, EntryKind};
pub use error::{Error, ErrorKind, FormatError, Result};
pub use extract::{ExtractReport, ExtractedEntry, HostTarget, Target, extract_archive, read_archive};
pub use format::Codec;
pub use options::{ExtractOptions, PermissionStrategy, Progress};
pub use sanitize::{SanitizedPath, sanitize_entry_path};

mod archive;
mod build;
pub mod entry;
mod error;
pub mod extract;
pub mod format;
pub mod options;
mod sanitize;
