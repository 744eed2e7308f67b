//! Shell completion generation
//!
//! Generates completion scripts for bash, zsh, fish, elvish and PowerShell,
//! covering every subcommand and flag (including `import --map/--unmap`
//! and the `contacts list` filters).
//!
//! # Usage
//!
//! ```bash
//! # Bash - add to ~/.bashrc
//! source <(outreach completions bash)
//!
//! # Zsh - add to ~/.zshrc
//! source <(outreach completions zsh)
//!
//! # Fish - add to ~/.config/fish/completions/outreach.fish
//! outreach completions fish > ~/.config/fish/completions/outreach.fish
//!
//! # Elvish - add to ~/.config/elvish/rc.elv
//! eval (outreach completions elvish | slurp)
//!
//! # PowerShell - add to $PROFILE
//! outreach completions powershell >> $PROFILE
//! ```

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use miette::Result;
use std::io;

use crate::cli::Cli;

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn run(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "outreach", &mut io::stdout());
    Ok(())
}
