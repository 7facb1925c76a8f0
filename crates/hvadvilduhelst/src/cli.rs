use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::*;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None, max_term_width = 72)]
pub(crate) struct Args {
    /// Number of threads to use. If this options isn't set or a value
    /// of "0" is chosen, the maximum number of available threads
    /// is used.
    #[clap(
        short = 'j',
        long,
        env = "HVADVILDUHELST_NUM_JOBS",
        hide_env_values = true
    )]
    pub(crate) num_jobs: Option<usize>,

    /// Use the config `filename` instead of discovering a
    /// `hvadvilduhelst.toml` in the current directory (or any parent
    /// directory).
    #[arg(short, long, value_name = "filename", global = true)]
    pub(crate) config: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) cmd: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    Completions(Completions),
    Config(Config),
    Export(Export),
    #[clap(alias = "new")]
    Init(Init),
    Probe(Probe),
    Quality(Quality),
    Show(Show),
    Summary(Summary),
    #[clap(alias = "push")]
    Upload(Upload),
}
