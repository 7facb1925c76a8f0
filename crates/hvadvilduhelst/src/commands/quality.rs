use std::path::{Path, PathBuf};

use clap::Parser;

use crate::prelude::*;
use crate::quality::{self, IssueKind, Report};

const MAX_EXAMPLES: usize = 3;

/// Maximum number of characters of a question in the report.
const MAX_WIDTH: usize = 80;

/// Check the dataset for potential quality issues.
#[derive(Debug, Default, Parser)]
pub(crate) struct Quality {
    #[command(flatten)]
    source: SourceArgs,

    /// Exit with an error, if any issue was found.
    #[arg(long)]
    strict: bool,

    /// Write all issues (CSV) to `filename`.
    #[arg(short, long, value_name = "filename")]
    output: Option<PathBuf>,

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

/// Prints the number of issues per kind together with the first
/// examples of each kind.
pub(crate) fn print_report(report: &Report) {
    println!("Quality");

    if report.is_empty() {
        println!("no issues found\n");
        return;
    }

    let counts = report.counts();
    for kind in IssueKind::ALL {
        let Some(count) = counts.get(&kind) else {
            continue;
        };

        println!("{} ({kind}): {count}", kind.title());
        for issue in report.of_kind(kind).take(MAX_EXAMPLES) {
            println!(
                "  {}: [{}] {}",
                issue.index,
                issue.category,
                truncate(issue.question, MAX_WIDTH)
            );
        }

        if *count > MAX_EXAMPLES {
            println!("  ... and {} more", count - MAX_EXAMPLES);
        }
    }

    println!();
}

/// Shortens `s` to at most `width` characters (plus an ellipsis).
fn truncate(s: &str, width: usize) -> String {
    match s.char_indices().nth(width) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

fn write_report(report: &Report, path: &Path) -> DatasetResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for issue in report.issues() {
        wtr.serialize(issue)?;
    }

    wtr.flush()?;
    Ok(())
}

impl Quality {
    pub(crate) fn execute(self, config: Config) -> DatasetResult<()> {
        let dataset = self.source.load(&config, self.quiet)?;
        let report = quality::assess(dataset.records(), &config.quality);

        if self.verbose {
            eprintln!(
                "Checked {} questions, found {} issue(s)",
                dataset.len(),
                report.len()
            );
        }

        print_report(&report);

        if let Some(ref path) = self.output {
            write_report(&report, path)?;
        }

        if self.strict && !report.is_empty() {
            bail!("found {} quality issue(s)", report.len());
        }

        Ok(())
    }
}
