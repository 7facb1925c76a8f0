use std::ffi::OsStr;
use std::fs::File;
use std::io::{stdout, BufWriter};
use std::path::{Path, PathBuf};

use polars::prelude::*;

use crate::prelude::*;

/// Write the assembled dataset to a file.
///
/// The format is derived from the file extension: JSON lines
/// (`.jsonl`, `.ndjson`), Arrow IPC (`.ipc`, `.arrow`) or CSV (any
/// other extension). Without an output file, CSV is written to the
/// standard output.
#[derive(Debug, Default, clap::Parser)]
pub(crate) struct Export {
    #[command(flatten)]
    source: SourceArgs,

    /// Run verbosely. Print additional progress information to the
    /// standard error stream. This option conflicts with the
    /// `--quiet` option.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Operate quietly; do not show progress. This option conflicts
    /// with the `--verbose` option.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Write output to `filename` instead of `stdout`.
    #[arg(short, long, value_name = "filename")]
    output: Option<PathBuf>,
}

pub(crate) fn write_dataset(
    dataset: &Dataset,
    path: &Path,
) -> DatasetResult<()> {
    let file = File::create(path)?;

    match path.extension().and_then(OsStr::to_str) {
        Some("jsonl" | "ndjson") => {
            dataset.write_jsonl(BufWriter::new(file))?;
        }
        Some("ipc" | "arrow") => {
            let mut df = dataset.to_frame()?;
            let compression = Some(IpcCompression::ZSTD);
            let mut writer =
                IpcWriter::new(file).with_compression(compression);
            writer.finish(&mut df)?;
        }
        _ => {
            let mut df = dataset.to_frame()?;
            let mut writer = CsvWriter::new(file);
            writer.finish(&mut df)?;
        }
    }

    Ok(())
}

impl Export {
    pub(crate) fn execute(self, config: Config) -> DatasetResult<()> {
        let dataset = self.source.load(&config, self.quiet)?;

        match self.output {
            Some(ref path) => write_dataset(&dataset, path)?,
            None => {
                let mut df = dataset.to_frame()?;
                let mut writer = CsvWriter::new(stdout().lock());
                writer.finish(&mut df)?;
            }
        }

        if self.verbose {
            eprintln!(
                "Exported {} questions from {}",
                dataset.len(),
                dataset.source().display()
            );
        }

        Ok(())
    }
}
