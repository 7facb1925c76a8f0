use std::io::ErrorKind;
use std::process;

use clap::Parser;
use cli::{Args, Command};
use env_logger::Env;
use error::{DatasetError, DatasetResult};
use jemallocator::Jemalloc;
use polars::error::PolarsError;
use rayon::ThreadPoolBuilder;

use crate::config::Config;

pub(crate) mod prelude {
    pub(crate) use crate::commands::SourceArgs;
    pub(crate) use crate::config::Config;
    pub(crate) use crate::dataset::Dataset;
    pub(crate) use crate::error::{bail, DatasetError, DatasetResult};
    pub(crate) use crate::progress::ProgressBarBuilder;
}

mod cli;
mod commands;
mod config;
mod dataset;
mod error;
mod hub;
mod loader;
mod progress;
mod quality;
mod record;
mod stats;
mod utils;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn num_threads(args: &Args, config: Option<&Config>) -> usize {
    if let Some(num_threads) = args.num_jobs {
        return num_threads;
    }

    if let Some(runtime) = config.and_then(|c| c.runtime.as_ref()) {
        if let Some(num_threads) = runtime.num_jobs {
            return num_threads;
        }
    }

    0
}

fn load_config(args: &Args) -> DatasetResult<Config> {
    match args.config {
        Some(ref path) => Config::from_path(path),
        None => Config::discover(),
    }
}

async fn run(args: Args) -> DatasetResult<()> {
    let config = match args.cmd {
        Command::Completions(_) | Command::Init(_) => None,
        _ => Some(load_config(&args)?),
    };

    ThreadPoolBuilder::new()
        .num_threads(num_threads(&args, config.as_ref()))
        .build_global()
        .map_err(DatasetError::other)?;

    let config = config.unwrap_or_default();

    match args.cmd {
        Command::Completions(cmd) => cmd.execute(),
        Command::Config(cmd) => cmd.execute(config),
        Command::Export(cmd) => cmd.execute(config),
        Command::Init(cmd) => cmd.execute(),
        Command::Probe(cmd) => cmd.execute(config),
        Command::Quality(cmd) => cmd.execute(config),
        Command::Show(cmd) => cmd.execute(config),
        Command::Summary(cmd) => cmd.execute(config),
        Command::Upload(cmd) => cmd.execute(config).await,
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(
        Env::default().filter_or("HVADVILDUHELST_LOG", "warn"),
    )
    .format_timestamp(None)
    .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => process::exit(0),
        Err(DatasetError::IO(e)) if e.kind() == ErrorKind::BrokenPipe => {
            process::exit(0)
        }
        Err(DatasetError::Polars(PolarsError::IO { error, .. }))
            if error.kind() == ErrorKind::BrokenPipe =>
        {
            process::exit(0);
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}
