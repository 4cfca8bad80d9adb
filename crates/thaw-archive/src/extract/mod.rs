//! Extraction pipeline.
//!
//! Every entry path is validated before the first write, so an archive with
//! a single unsafe path writes nothing at all. Existing files at entry paths
//! are overwritten; files not named by the archive are left alone.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::archive::Archive;
use crate::entry::Entry;
use crate::error::Result;
use crate::format::Codec;
use crate::options::{ExtractOptions, Progress};
use crate::sanitize::sanitize_entry_path;

mod target;

pub use target::{HostTarget, Target};

#[derive(Clone, Debug)]
pub struct ExtractedEntry {
    pub entry: Entry,
    pub target_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ExtractReport {
    pub codec: Codec,
    pub files: usize,
    pub directories: usize,
    pub total_bytes: u64,
    pub entries: Vec<ExtractedEntry>,
}

impl ExtractReport {
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Parse `blob`, checking the header, manifest and payload digest.
pub fn read_archive(blob: &[u8]) -> Result<Archive<'_>> {
    Ok(Archive::parse(blob)?)
}

/// Validate `blob` and write its entries under `root` through `target`.
pub fn extract_archive<T: Target>(
    blob: &[u8],
    root: impl AsRef<Path>,
    mut target: T,
    options: &ExtractOptions,
) -> Result<ExtractReport> {
    let root = root.as_ref();
    let archive = read_archive(blob)?;

    let resolved = archive
        .entries()
        .iter()
        .map(|entry| sanitize_entry_path(&entry.path, root).map(|p| p.resolved))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let payload = archive.unpack()?;
    let total_bytes = archive.header().unpacked_size;

    target.create_dir_all(root)?;

    let mut entries = Vec::with_capacity(resolved.len());
    let mut bytes_processed = 0u64;
    let mut files = 0usize;

    for ((entry, contents), target_path) in archive.contents(&payload)?.into_iter().zip(resolved) {
        if entry.is_directory() {
            debug!(path = %entry.path, "create directory");
            target.create_dir_all(&target_path)?;
        } else {
            if let Some(parent) = target_path.parent() {
                target.create_dir_all(parent)?;
            }
            debug!(path = %entry.path, size = entry.size, "write file");
            let mode = options.permissions.mode_for(entry.executable);
            target.write_file(&target_path, contents, mode)?;
            files += 1;
        }

        bytes_processed += entry.size;
        options.report(|| Progress {
            bytes_processed,
            total_bytes,
            current_file: target_path.clone(),
        });

        entries.push(ExtractedEntry {
            entry: entry.clone(),
            target_path,
        });
    }

    info!(
        root = %root.display(),
        files,
        bytes = total_bytes,
        codec = %archive.codec(),
        "archive extracted"
    );

    Ok(ExtractReport {
        codec: archive.codec(),
        files,
        directories: entries.len() - files,
        total_bytes,
        entries,
    })
}
