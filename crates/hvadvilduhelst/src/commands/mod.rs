use std::path::PathBuf;

use crate::dataset::Dataset;
use crate::error::DatasetResult;
use crate::loader::{Loader, ValidationPolicy};

pub(crate) use completions::Completions;
pub(crate) use config::Config;
pub(crate) use export::Export;
pub(crate) use init::Init;
pub(crate) use probe::Probe;
pub(crate) use quality::Quality;
pub(crate) use show::Show;
pub(crate) use summary::Summary;
pub(crate) use upload::Upload;

mod completions;
mod config;
mod export;
mod init;
mod probe;
mod quality;
mod show;
mod summary;
mod upload;

/// Options that select and validate the category files.
#[derive(Debug, Default, clap::Args)]
pub(crate) struct SourceArgs {
    /// A directory containing the category files (`<category>.jsonl`).
    /// The option can be given multiple times; the directories are
    /// tried in order. If set, the `data.paths` option of the config
    /// is ignored.
    #[arg(short, long = "data-dir", value_name = "path")]
    data_dirs: Vec<PathBuf>,

    /// What to do with malformed lines. Overrides the `data.policy`
    /// option of the config.
    #[arg(long, value_name = "policy")]
    policy: Option<ValidationPolicy>,
}

impl SourceArgs {
    /// Loads the first existing candidate directory and rejects an
    /// empty dataset.
    pub(crate) fn load(
        &self,
        config: &crate::config::Config,
        quiet: bool,
    ) -> DatasetResult<Dataset> {
        let candidates = if self.data_dirs.is_empty() {
            config.data_candidates()
        } else {
            self.data_dirs.clone()
        };

        let policy = self.policy.unwrap_or(config.data.policy);
        Loader::new(policy)
            .quiet(quiet)
            .load_first(&candidates)?
            .ensure_not_empty()
    }
}
