use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{self, Stdio};
use std::{env, fs};

use clap::Parser;
use semver::Version;

use crate::prelude::*;

/// Create a new or re-initialize an existing `hvadvilduhelst.toml`.
#[derive(Debug, Parser)]
pub(crate) struct Init {
    /// The name of the dataset. By default the name of the project
    /// directory is used.
    #[arg(short, long)]
    name: Option<String>,

    /// The version of the dataset.
    #[arg(long, default_value = "0.1.0")]
    version: Version,

    /// A short blurb about the dataset.
    #[arg(short, long)]
    description: Option<String>,

    /// A list of people or organizations, which are considered as the
    /// authors of the dataset. By default the list is populated with
    /// the git identity (if available).
    #[arg(short, long = "author")]
    authors: Vec<String>,

    /// The license identifier of the dataset (e.g. `cc-by-4.0`).
    #[arg(short, long)]
    license: Option<String>,

    /// A directory containing the category files. The option can be
    /// given multiple times. Relative paths are resolved against the
    /// project directory.
    #[arg(long = "data-dir", value_name = "path")]
    data_dirs: Vec<PathBuf>,

    /// Whether to overwrite config with default values or not.
    #[arg(short, long)]
    force: bool,

    /// Run verbosely. Print additional progress information to the
    /// standard error stream. This option conflicts with the
    /// `--quiet` option.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Operate quietly; do not show progress. This option conflicts
    /// with the `--verbose` option.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// The location of the project.
    #[arg(default_value = ".")]
    path: PathBuf,
}

fn git_user(path: &Path) -> Option<String> {
    let git_config = |key: &str| {
        process::Command::new("git")
            .arg("config")
            .arg("--get")
            .arg(key)
            .current_dir(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .ok()
            .and_then(|output| String::from_utf8(output.stdout).ok())
            .map(|value| value.trim_end().to_string())
            .filter(|value| !value.is_empty())
    };

    let mut user = git_config("user.name")?;
    if let Some(email) = git_config("user.email") {
        user.push_str(&format!(" <{email}>"));
    }

    Some(user)
}

impl Init {
    pub(crate) fn execute(mut self) -> DatasetResult<()> {
        let root_dir = env::current_dir()?.join(&self.path);
        let path = root_dir.join(Config::FILENAME);

        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
            if self.verbose {
                eprintln!("Initialize new project in {}", root_dir.display());
            }
        } else if !root_dir.is_dir() {
            bail!("{} is not a directory", root_dir.display());
        }

        if path.exists() && !self.force {
            if !self.quiet {
                eprintln!(
                    "Config {} already exists (use --force to overwrite).",
                    path.display()
                );
            }

            return Ok(());
        }

        if self.authors.is_empty() {
            if let Some(author) = git_user(&root_dir) {
                if self.verbose {
                    eprintln!("Set authors to Git identity '{author}'.");
                }

                self.authors.push(author)
            }
        }

        let mut config = Config::create(&path)?;
        config.metadata.description = self.description;
        config.metadata.authors = self.authors;
        config.metadata.version = self.version;
        config.metadata.license = self.license;
        config.metadata.name = self.name.unwrap_or_else(|| {
            root_dir
                .canonicalize()
                .unwrap_or_else(|_| root_dir.clone())
                .file_name()
                .and_then(OsStr::to_str)
                .unwrap_or("hvadvilduhelst")
                .to_string()
        });

        if !self.data_dirs.is_empty() {
            config.data.paths = self.data_dirs;
        }

        config.save()?;

        if self.verbose {
            eprintln!("Wrote config {}", path.display());
        }

        Ok(())
    }
}
