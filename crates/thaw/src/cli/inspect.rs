use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tabled::Tabled;
use thaw_archive::{Archive, Entry};

use crate::utils::ui::table::{FormatConfig, Formatter};

#[derive(Args, Clone, Debug)]
pub struct ListArg {
    #[arg(help = "Archive blob")]
    blob: PathBuf,
}

#[derive(Args, Clone, Debug)]
pub struct VerifyArg {
    #[arg(help = "Archive blob")]
    blob: PathBuf,
}

#[derive(Tabled)]
struct EntryRow {
    path: String,
    kind: &'static str,
    size: u64,
    mode: &'static str,
}

impl From<&Entry> for EntryRow {
    fn from(entry: &Entry) -> Self {
        Self {
            path: entry.path.clone(),
            kind: if entry.is_directory() { "dir" } else { "file" },
            size: entry.size,
            mode: if entry.executable { "exec" } else { "-" },
        }
    }
}

fn read_blob(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))
}

pub fn list(arg: ListArg) -> Result<()> {
    println!("{}", render_list(&arg.blob)?);
    Ok(())
}

fn render_list(path: &Path) -> Result<String> {
    let blob = read_blob(path)?;
    let archive =
        Archive::parse(&blob).with_context(|| format!("Invalid archive '{}'", path.display()))?;
    let header = archive.header();

    let config = FormatConfig {
        header: Some(format!(
            "{} ({}, {} entries)",
            path.display(),
            header.codec,
            header.entry_count
        )),
        footer: Some(format!(
            "{} bytes unpacked, {} stored, sha256 {}",
            header.unpacked_size,
            header.stored_size,
            header.digest_hex()
        )),
    };
    let rows = archive.entries().iter().map(EntryRow::from);
    Ok(Formatter::table(rows, config).to_string())
}

pub fn verify(arg: VerifyArg) -> Result<()> {
    let digest = check(&arg.blob)?;
    println!("ok {} sha256 {}", arg.blob.display(), digest);
    Ok(())
}

/// Parse, digest-check and fully decompress a blob.
fn check(path: &Path) -> Result<String> {
    let blob = read_blob(path)?;
    let archive =
        Archive::parse(&blob).with_context(|| format!("Invalid archive '{}'", path.display()))?;
    archive
        .unpack()
        .with_context(|| format!("Corrupt payload in '{}'", path.display()))?;
    Ok(archive.header().digest_hex())
}
