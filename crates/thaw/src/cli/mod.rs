use anyhow::Result;

use crate::cli::app::{App, Commands};
use crate::env::ThawEnv;

pub mod app;
pub mod boot;
pub mod inspect;
pub mod manifest;
pub mod pack;
pub mod setup;
pub mod unpack;

pub fn run(app: App) -> Result<()> {
    let env = ThawEnv::new(app.global.config.clone())?;
    tracing::debug!(config = %env.config_path().display(), "resolved config path");

    match app.cmd {
        Commands::Pack(arg) => pack::pack(arg, &env.config()?),
        Commands::List(arg) => inspect::list(arg),
        Commands::Verify(arg) => inspect::verify(arg),
        Commands::Unpack(arg) => unpack::unpack(arg),
        Commands::Boot(arg) => boot::boot(arg, &env.config()?),
        Commands::Manifest(arg) => manifest::manifest(arg, &env.config()?),
        Commands::Completions(arg) => setup::completions(arg),
    }
}
