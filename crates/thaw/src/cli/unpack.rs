use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use thaw_archive::{
    ExtractOptions, ExtractReport, HostTarget, PermissionStrategy, Progress, extract_archive,
};

use crate::utils::ui::tracker::ProgressTracker;

#[derive(Args, Clone, Debug)]
pub struct UnpackArg {
    #[arg(help = "Archive blob")]
    blob: PathBuf,
    #[arg(help = "Directory to extract into")]
    root: PathBuf,
    #[arg(long, help = "Do not apply permissions from the archive")]
    no_permissions: bool,
    #[arg(long, help = "Hide the progress bar")]
    no_progress: bool,
}

pub fn unpack(arg: UnpackArg) -> Result<()> {
    let report = run(&arg)?;
    println!(
        "unpacked {} files, {} directories ({} bytes) into {}",
        report.files,
        report.directories,
        report.total_bytes,
        arg.root.display()
    );
    Ok(())
}

fn run(arg: &UnpackArg) -> Result<ExtractReport> {
    let blob = std::fs::read(&arg.blob)
        .with_context(|| format!("Failed to read '{}'", arg.blob.display()))?;

    let tracker = if arg.no_progress {
        ProgressTracker::hidden()
    } else {
        ProgressTracker::new(0, "unpacking")
    };

    let permissions = if arg.no_permissions {
        PermissionStrategy::Skip
    } else {
        PermissionStrategy::Standard
    };

    let bar = tracker.clone();
    let options = ExtractOptions::default()
        .permissions(permissions)
        .on_progress(Arc::new(move |progress: Progress| {
            bar.pb.set_length(progress.total_bytes);
            bar.set(
                progress.bytes_processed,
                progress.current_file.display().to_string(),
            );
        }));

    let result = extract_archive(&blob, &arg.root, HostTarget::new(), &options);
    tracker.finish(None);

    result.with_context(|| {
        format!(
            "Failed to unpack '{}' into '{}'",
            arg.blob.display(),
            arg.root.display()
        )
    })
}
