use anyhow::{Context, Result, anyhow};
use clap::Args;
use std::path::{Path, PathBuf};
use thaw_archive::{BuildOptions, BuildReport, Codec, build_archive_to};
use thaw_boot::DEFAULT_MARKER;

use crate::env::Config;

#[derive(Args, Clone, Debug, Default)]
pub struct PackArg {
    #[arg(help = "Directory to pack (default: [pack].source)")]
    source: Option<PathBuf>,
    #[arg(short, long, help = "Blob to write (default: [pack].output)")]
    output: Option<PathBuf>,
    #[arg(long, help = "Compression codec: none, gzip or zstd")]
    codec: Option<Codec>,
    #[arg(long, help = "Codec-specific compression level")]
    level: Option<u32>,
    #[arg(long = "exclude", value_name = "NAME", help = "Skip files or directories with this name, repeatable")]
    exclude: Vec<String>,
}

pub fn pack(arg: PackArg, config: &Config) -> Result<()> {
    let report = run(arg, config)?;
    println!(
        "packed {} files, {} directories: {} -> {} bytes ({}), sha256 {}",
        report.files,
        report.directories,
        report.unpacked_bytes,
        report.blob_bytes,
        report.codec,
        report.digest
    );
    Ok(())
}

fn run(arg: PackArg, config: &Config) -> Result<BuildReport> {
    let pack = &config.pack;

    let source = arg
        .source
        .or_else(|| pack.source.clone())
        .ok_or_else(|| anyhow!("No source directory given and [pack].source is not set"))?;
    let output = arg
        .output
        .or_else(|| pack.output.clone())
        .ok_or_else(|| anyhow!("No output given and [pack].output is not set"))?;

    let codec = match (arg.codec, &pack.codec) {
        (Some(codec), _) => codec,
        (None, Some(name)) => name
            .parse::<Codec>()
            .map_err(|e| anyhow!(e))
            .context("Invalid [pack].codec")?,
        (None, None) => Codec::default(),
    };

    let mut options = BuildOptions::default().codec(codec);
    if let Some(level) = arg.level.or(pack.level) {
        options = options.level(level);
    }
    for name in pack.exclude.iter().chain(arg.exclude.iter()) {
        options = options.exclude(name.clone());
    }
    // A tree copied back from a device carries the boot marker.
    if let Some(name) = marker_name(config) {
        options = options.exclude(name);
    }

    build_archive_to(&source, &output, &options).with_context(|| {
        format!(
            "Failed to pack '{}' into '{}'",
            source.display(),
            output.display()
        )
    })
}

fn marker_name(config: &Config) -> Option<&str> {
    config
        .boot
        .marker
        .as_deref()
        .unwrap_or(Path::new(DEFAULT_MARKER))
        .file_name()
        .and_then(|name| name.to_str())
}
