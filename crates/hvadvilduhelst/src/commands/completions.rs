use std::fs::File;
use std::io::{stdout, Write};
use std::path::PathBuf;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Args;
use crate::prelude::*;

/// Generate completion scripts for various shells.
///
/// Without a shell argument the shell is derived from the `SHELL`
/// environment variable.
#[derive(Debug, clap::Parser)]
pub(crate) struct Completions {
    /// Write the script to `filename` instead of `stdout`.
    #[arg(long, short, value_name = "filename")]
    output: Option<PathBuf>,

    /// Shell for which a completion script is to be generated.
    #[arg(value_name = "shell")]
    shell: Option<Shell>,
}

impl Completions {
    fn shell(&self) -> DatasetResult<Shell> {
        self.shell.or_else(Shell::from_env).ok_or_else(|| {
            DatasetError::config(
                "unable to detect the shell from $SHELL (expected one \
                    of bash, elvish, fish, powershell or zsh)",
            )
        })
    }

    /// Writes the completion script of the `hvadvilduhelst` binary.
    fn write<W: Write>(&self, mut wtr: W) -> DatasetResult<()> {
        let shell = self.shell()?;
        let mut cmd = Args::command();
        let bin_name = cmd.get_name().to_string();

        generate(shell, &mut cmd, bin_name, &mut wtr);
        wtr.flush()?;
        Ok(())
    }

    pub(crate) fn execute(self) -> DatasetResult<()> {
        match self.output {
            Some(ref path) => self.write(File::create(path)?),
            None => self.write(stdout().lock()),
        }
    }
}
