use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use std::path::PathBuf;
use thaw_archive::HostTarget;
use thaw_boot::{BootConfig, BootOutcome, Bootstrap};

use crate::env::Config;

#[derive(Args, Clone, Debug, Default)]
pub struct BootArg {
    #[arg(help = "Archive blob (default: [boot].archive)")]
    blob: Option<PathBuf>,
    #[arg(long, help = "Extraction root (default: [boot].root)")]
    root: Option<PathBuf>,
    #[arg(long, help = "Marker file, relative to the root unless absolute")]
    marker: Option<PathBuf>,
    #[arg(long, help = "Exit with an error when extraction fails")]
    strict: bool,
}

pub fn boot(arg: BootArg, config: &Config) -> Result<()> {
    let strict = arg.strict;
    let outcome = run(arg, config)?;

    match &outcome {
        BootOutcome::Skipped => println!("marker present, nothing to do"),
        BootOutcome::Extracted(report) => println!(
            "extracted {} files ({} bytes), marker written",
            report.files, report.total_bytes
        ),
        BootOutcome::Failed(err) => {
            if strict {
                bail!("Extraction failed: {err}");
            }
            println!("extraction failed, will retry on next boot: {err}");
        }
    }
    Ok(())
}

fn run(arg: BootArg, config: &Config) -> Result<BootOutcome> {
    let section = &config.boot;

    let blob_path = arg
        .blob
        .or_else(|| section.archive.clone())
        .ok_or_else(|| anyhow!("No archive given and [boot].archive is not set"))?;
    let root = arg
        .root
        .or_else(|| section.root.clone())
        .ok_or_else(|| anyhow!("No --root given and [boot].root is not set"))?;

    let mut boot_config = BootConfig::new(root);
    if let Some(marker) = arg.marker.or_else(|| section.marker.clone()) {
        boot_config = boot_config.marker(marker);
    }
    if let Some(note) = &section.marker_note {
        boot_config = boot_config.marker_note(note.clone());
    }

    let blob = std::fs::read(&blob_path)
        .with_context(|| format!("Failed to read '{}'", blob_path.display()))?;

    Ok(Bootstrap::new(&blob, boot_config).run(HostTarget::new().sync(true)))
}
