use clap::Parser;
use comfy_table::{presets, Row, Table};

use crate::prelude::*;
use crate::stats::{self, Describe};

/// Print structure, category, characteristics and theme statistics
/// of the dataset.
#[derive(Debug, Default, Parser)]
pub(crate) struct Summary {
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
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table
}

#[inline]
fn fmt_f64(value: f64) -> String {
    format!("{value:.1}")
}

pub(crate) fn print_structure(dataset: &Dataset) {
    let categories = dataset.categories();

    let mut table = new_table();
    table.add_row(["source".into(), dataset.source().display().to_string()]);
    table.add_row(["questions".into(), dataset.len().to_string()]);
    table.add_row(["categories".into(), categories.len().to_string()]);
    table.add_row([
        "names".into(),
        categories.into_iter().collect::<Vec<_>>().join(", "),
    ]);
    table.add_row(["blank fields".into(), dataset.blank().to_string()]);
    table.add_row([
        "skipped lines".into(),
        dataset.skipped().len().to_string(),
    ]);

    println!("Structure\n{table}\n");
}

pub(crate) fn print_categories(dataset: &Dataset) -> DatasetResult<()> {
    let df = dataset.category_frame()?;
    let categories = df.column("category")?.str()?;
    let questions = df.column("questions")?.u64()?;
    let uniques = df.column("unique")?.u64()?;
    let duplicates = df.column("duplicates")?.u64()?;

    let mut table = new_table();
    table.set_header(Row::from(vec![
        "category",
        "questions",
        "unique",
        "duplicates",
    ]));

    for idx in 0..df.height() {
        table.add_row([
            categories.get(idx).unwrap_or_default().to_string(),
            questions.get(idx).unwrap_or_default().to_string(),
            uniques.get(idx).unwrap_or_default().to_string(),
            duplicates.get(idx).unwrap_or_default().to_string(),
        ]);
    }

    println!("Categories\n{table}");

    if let Some(stats) = stats::category_stats(dataset.records()) {
        let Describe {
            mean, std, min, max, ..
        } = stats.describe;

        println!(
            "mean: {}, std: {}, min: {min}, max: {max} ({})\n",
            fmt_f64(mean),
            fmt_f64(std),
            if stats.is_balanced() {
                "balanced"
            } else {
                "unbalanced"
            }
        );
    }

    Ok(())
}

pub(crate) fn print_characteristics(dataset: &Dataset) {
    let Some(chars) = stats::characteristics(dataset.records()) else {
        return;
    };

    let mut table = new_table();
    table.set_header(Row::from(vec![
        "", "mean", "median", "std", "min", "max",
    ]));

    for (name, describe) in [
        ("question length", &chars.question_length),
        ("answer A length", &chars.answer_a_length),
        ("answer B length", &chars.answer_b_length),
        ("words per question", &chars.word_count),
    ] {
        table.add_row([
            name.to_string(),
            fmt_f64(describe.mean),
            fmt_f64(describe.median),
            fmt_f64(describe.std),
            describe.min.to_string(),
            describe.max.to_string(),
        ]);
    }

    println!("Characteristics\n{table}\n");

    let mut table = new_table();
    table.set_header(Row::from(vec!["starter", "questions"]));
    for (starter, count) in chars.starters.iter() {
        table.add_row([starter.clone(), count.to_string()]);
    }

    println!("Common question starters\n{table}\n");
}

pub(crate) fn print_themes(dataset: &Dataset) {
    let themes = stats::themes(dataset.records());
    if themes.is_empty() {
        println!("Themes\nno theme keywords found\n");
        return;
    }

    let mut table = new_table();
    table.set_header(Row::from(vec!["theme", "questions", "share"]));
    for theme in themes.iter() {
        table.add_row([
            theme.name.to_string(),
            theme.count.to_string(),
            format!("{:.1}%", theme.percentage),
        ]);
    }

    println!("Themes\n{table}\n");
}

impl Summary {
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
        Ok(())
    }
}
