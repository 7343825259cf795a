//! Shell completions command.

use anyhow::{Context, Result};
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::fs::File;
use std::io;
use std::path::PathBuf;

use crate::cli::Cli;

/// Arguments for the completions command.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the completions command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    match args.output {
        Some(path) => {
            let mut file =
                File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
            generate(args.shell, &mut cmd, name, &mut file);
        }
        None => generate(args.shell, &mut cmd, name, &mut io::stdout()),
    }

    Ok(())
}
