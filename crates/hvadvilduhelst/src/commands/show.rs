use clap::Parser;

use crate::prelude::*;

/// Print example questions per category.
#[derive(Debug, Default, Parser)]
pub(crate) struct Show {
    #[command(flatten)]
    source: SourceArgs,

    /// Number of examples per category.
    #[arg(short = 'n', long, default_value = "3", value_name = "n")]
    num_examples: usize,

    /// Only show the given category. The option can be given multiple
    /// times.
    #[arg(long = "category", value_name = "name")]
    categories: Vec<String>,

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

/// Prints the first `n` questions of each (selected) category.
pub(crate) fn print_examples(
    dataset: &Dataset,
    n: usize,
    filter: &[String],
) -> DatasetResult<()> {
    let groups = dataset.by_category();

    for name in filter.iter() {
        if !groups.contains_key(name.as_str()) {
            bail!("unknown category `{name}`");
        }
    }

    for (category, records) in groups.iter() {
        if !filter.is_empty()
            && !filter.iter().any(|c| c.as_str() == *category)
        {
            continue;
        }

        println!(
            "{} ({} questions)",
            category.to_uppercase(),
            records.len()
        );
        for (idx, record) in records.iter().take(n).enumerate() {
            println!("  {}. {}", idx + 1, record.question);
            println!("     A: {}", record.answer_a);
            println!("     B: {}", record.answer_b);
        }

        println!();
    }

    Ok(())
}

impl Show {
    pub(crate) fn execute(self, config: Config) -> DatasetResult<()> {
        let dataset = self.source.load(&config, self.quiet)?;

        if self.verbose {
            eprintln!(
                "Loaded {} questions from {}",
                dataset.len(),
                dataset.source().display()
            );
        }

        print_examples(&dataset, self.num_examples, &self.categories)
    }
}
