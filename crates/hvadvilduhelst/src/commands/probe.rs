use clap::Parser;

use super::quality::print_report;
use super::show::print_examples;
use super::summary::{
    print_categories, print_characteristics, print_structure,
    print_themes,
};
use crate::prelude::*;
use crate::quality::{self, IssueKind};
use crate::stats;

/// Questions per category of a temperature experiment.
const TEMPERATURE_SUBSET: usize = 50;

/// Minimum number of questions of a well-represented category.
const WELL_REPRESENTED: usize = 35;

/// Run every report and print recommendations for experiments.
#[derive(Debug, Default, Parser)]
pub(crate) struct Probe {
    #[command(flatten)]
    source: SourceArgs,

    /// Number of examples per category.
    #[arg(short = 'n', long, default_value = "2", value_name = "n")]
    num_examples: usize,

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

#[derive(Debug, PartialEq)]
struct Recommendations<'a> {
    total: usize,
    temperature_subset: usize,
    well_represented: Vec<(&'a str, usize)>,
    duplicates: usize,
}

fn recommend<'a>(
    stats: &'a stats::CategoryStats,
    total: usize,
    duplicates: usize,
) -> Recommendations<'a> {
    Recommendations {
        total,
        temperature_subset: TEMPERATURE_SUBSET * stats.counts.len(),
        well_represented: stats.well_represented(WELL_REPRESENTED),
        duplicates,
    }
}

fn print_recommendations(recs: &Recommendations) {
    println!("Recommendations");
    println!("  total questions: {}", recs.total);
    println!(
        "  temperature experiments: {} questions \
            ({TEMPERATURE_SUBSET} per category)",
        recs.temperature_subset
    );

    if recs.well_represented.is_empty() {
        println!(
            "  no category has at least {WELL_REPRESENTED} questions"
        );
    } else {
        println!(
            "  well-represented categories (>= {WELL_REPRESENTED} \
                questions):"
        );
        for (category, count) in recs.well_represented.iter() {
            println!("    {category}: {count}");
        }
    }

    if recs.duplicates > 0 {
        println!(
            "  remove {} duplicate question(s) before running \
                experiments",
            recs.duplicates
        );
    }
}

impl Probe {
    pub(crate) fn execute(self, config: Config) -> DatasetResult<()> {
        let dataset = self.source.load(&config, self.quiet)?;

        if self.verbose {
            eprintln!(
                "Loaded {} questions from {}",
                dataset.len(),
                dataset.source().display()
            );
        }

        print_structure(&dataset);
        print_categories(&dataset)?;
        print_characteristics(&dataset);
        print_themes(&dataset);

        println!("Examples");
        print_examples(&dataset, self.num_examples, &[])?;

        let report = quality::assess(dataset.records(), &config.quality);
        print_report(&report);

        let Some(stats) = stats::category_stats(dataset.records()) else {
            return Ok(());
        };

        let duplicates =
            report.of_kind(IssueKind::DuplicateQuestion).count();
        print_recommendations(&recommend(
            &stats,
            dataset.len(),
            duplicates,
        ));
        Ok(())
    }
}
