use anyhow::Result;
use clap::Parser;

use crate::cli::app::App;

mod cli;
mod env;
mod utils;

fn main() -> Result<()> {
    let app = App::parse();
    utils::logging::init(app.global.verbose, app.global.quiet);
    cli::run(app)
}
