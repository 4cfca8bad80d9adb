use crate::cli::app::App;
use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{Shell, generate};

#[derive(Args, Clone, Debug)]
pub struct CompletionsArg {
    #[arg(value_enum, help = "Shell to generate completions for")]
    shell: Shell,
}

pub fn completions(arg: CompletionsArg) -> Result<()> {
    let mut c = App::command();
    let mut stdio = std::io::stdout();
    generate(arg.shell, &mut c, "thaw", &mut stdio);
    Ok(())
}
