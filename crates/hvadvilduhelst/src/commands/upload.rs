use std::io::{stderr, IsTerminal};
use std::time::Duration;

use clap::Parser;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use humansize::{make_format, BINARY};

use crate::hub::{Credentials, HubClient, Payload};
use crate::prelude::*;

const PBAR_UPLOAD: &str =
    "{spinner} Uploading to {msg} | elapsed: {elapsed_precise}";

/// Publish the dataset to the Hugging Face hub.
///
/// The records are uploaded as JSON lines (`data/<split>.jsonl`)
/// together with a generated dataset card (`README.md`) in a single
/// commit. The repository is created, if it doesn't exist yet.
#[derive(Debug, Parser)]
pub(crate) struct Upload {
    #[command(flatten)]
    source: SourceArgs,

    /// The hub access token.
    #[arg(long, env = "HUGGINGFACE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// The dataset repository (`namespace/name`). If not set, the
    /// `hub.repo-id` option of the config is used.
    #[arg(long, env = "HUGGINGFACE_REPO_ID", value_name = "repo")]
    repo_id: Option<String>,

    /// The split label of the uploaded records. Overrides the
    /// `hub.split` option of the config.
    #[arg(long)]
    split: Option<String>,

    /// The branch to commit to. Overrides the `hub.revision` option of
    /// the config.
    #[arg(long)]
    revision: Option<String>,

    /// Create the repository as a private repository.
    #[arg(long)]
    private: bool,

    /// Print what would be uploaded without contacting the hub.
    #[arg(long)]
    dry_run: bool,

    /// Don't ask for confirmation.
    #[arg(short, long)]
    yes: bool,

    /// Run verbosely. Print additional progress information to the
    /// standard error stream. This option conflicts with the
    /// `--quiet` option.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Operate quietly; do not show progress. This option conflicts
    /// with the `--verbose` option.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Upload {
    pub(crate) async fn execute(
        self,
        config: Config,
    ) -> DatasetResult<()> {
        let credentials = Credentials::resolve(
            self.token,
            self.repo_id.or_else(|| config.hub.repo_id.clone()),
        )?;

        let split =
            self.split.unwrap_or_else(|| config.hub.split.clone());
        let revision =
            self.revision.unwrap_or_else(|| config.hub.revision.clone());
        let private = self.private || config.hub.private;

        let dataset = self.source.load(&config, self.quiet)?;
        let payload = Payload::new(&dataset, &config.metadata, &split)?;

        let formatter = make_format(BINARY);
        let repo_id = credentials.repo_id().to_string();

        if !self.quiet || self.dry_run {
            eprintln!("{} to {repo_id}@{revision}", payload.summary());
            for (path, size) in payload.files() {
                eprintln!("  {path} ({})", formatter(size));
            }
        }

        if self.dry_run {
            return Ok(());
        }

        if !self.yes && stderr().is_terminal() {
            let confirmed = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(format!(
                    "Upload {} to {repo_id}?",
                    formatter(payload.size())
                ))
                .default(false)
                .show_default(true)
                .interact()?;

            if !confirmed {
                bail!("upload aborted");
            }
        }

        let client =
            HubClient::new(config.hub.endpoint.clone(), credentials)?;
        if client.create_repo(private).await? && self.verbose {
            eprintln!("Created dataset repository {repo_id}");
        }

        let pbar =
            ProgressBarBuilder::new(PBAR_UPLOAD, self.quiet).build();
        pbar.set_message(repo_id.clone());
        pbar.enable_steady_tick(Duration::from_millis(100));
        let commit = client.commit(&payload, &revision).await;
        pbar.finish_and_clear();

        match commit? {
            Some(url) if !self.quiet => eprintln!("Committed {url}"),
            None if self.verbose => {
                eprintln!("Committed to {repo_id}@{revision}")
            }
            _ => (),
        }

        Ok(())
    }
}
