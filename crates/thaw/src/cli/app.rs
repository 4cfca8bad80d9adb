use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::cli::boot::BootArg;
use crate::cli::inspect::{ListArg, VerifyArg};
use crate::cli::manifest::ManifestArg;
use crate::cli::pack::PackArg;
use crate::cli::setup::CompletionsArg;
use crate::cli::unpack::UnpackArg;

#[derive(Clone, Debug, Parser)]
#[command(name = "thaw", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Args)]
pub struct GlobalArgs {
    #[arg(long, global = true, help = "Config file (default: $THAW_CONFIG or ./thaw.toml)")]
    pub config: Option<PathBuf>,
    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "More log output, repeatable")]
    pub verbose: u8,
    #[arg(short, long, global = true, conflicts_with = "verbose", help = "Only log errors")]
    pub quiet: bool,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "p", name = "pack", about = "Pack a directory into an archive blob")]
    Pack(PackArg),
    #[command(alias = "ls", name = "list", about = "List the entries of an archive blob")]
    List(ListArg),
    #[command(name = "verify", about = "Check an archive blob's header, manifest and digest")]
    Verify(VerifyArg),
    #[command(alias = "x", name = "unpack", about = "Extract an archive blob unconditionally")]
    Unpack(UnpackArg),
    #[command(name = "boot", about = "Run the first-boot extraction once")]
    Boot(BootArg),
    #[command(name = "manifest", about = "Render the firmware freeze manifest")]
    Manifest(ManifestArg),
    #[command(name = "completions", about = "Generate shell completions")]
    Completions(CompletionsArg),
}
