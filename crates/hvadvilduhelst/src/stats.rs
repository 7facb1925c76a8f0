//! Descriptive statistics over a set of question records.
//!
//! All functions work on a slice of records and return `None` (or an
//! empty result) for an empty slice.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use ndarray::Array1;
use ndarray_stats::QuantileExt;

use crate::record::QuestionRecord;

/// A dataset is considered balanced, if the coefficient of variation
/// of the category sizes is below this threshold.
pub(crate) const BALANCE_THRESHOLD: f64 = 0.2;

/// Keyword themes. A question belongs to a theme, if its lowercased
/// text contains at least one of the keywords.
pub(crate) const THEMES: &[(&str, &[&str])] = &[
    ("arbejde", &["arbejde", "job", "chef", "kontor", "løn"]),
    ("family", &["familie", "mor", "far", "barn", "børn", "forældre"]),
    ("food", &["mad", "spise", "pizza", "chokolade", "kaffe"]),
    ("physical", &["krop", "hoved", "arm", "ben", "øje", "næse"]),
    ("time", &["dag", "uge", "måned", "år", "tid", "altid", "aldrig"]),
    ("choice_intensity", &["helst", "ville", "eller", "frem for"]),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Describe {
    pub(crate) mean: f64,
    pub(crate) median: f64,
    /// Population standard deviation.
    pub(crate) std: f64,
    pub(crate) min: f64,
    pub(crate) max: f64,
}

/// Computes mean, median, standard deviation and range.
pub(crate) fn describe(values: &[usize]) -> Option<Describe> {
    let x = Array1::from_iter(values.iter().map(|v| *v as f64));
    let mean = x.mean()?;
    let min = *x.min().ok()?;
    let max = *x.max().ok()?;

    let mut sorted = x.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    Some(Describe {
        mean,
        median,
        std: x.std(0.0),
        min,
        max,
    })
}

#[derive(Debug)]
pub(crate) struct CategoryStats {
    /// Number of questions per category, sorted by category.
    pub(crate) counts: BTreeMap<String, usize>,
    pub(crate) describe: Describe,
}

impl CategoryStats {
    /// Whether the categories are (roughly) of the same size.
    pub(crate) fn is_balanced(&self) -> bool {
        self.describe.std / self.describe.mean < BALANCE_THRESHOLD
    }

    /// Returns the categories with at least `threshold` questions.
    pub(crate) fn well_represented(
        &self,
        threshold: usize,
    ) -> Vec<(&str, usize)> {
        self.counts
            .iter()
            .filter(|(_, count)| **count >= threshold)
            .map(|(category, count)| (category.as_str(), *count))
            .collect()
    }
}

pub(crate) fn category_stats(
    records: &[QuestionRecord],
) -> Option<CategoryStats> {
    let mut counts = BTreeMap::<String, usize>::new();
    for record in records.iter() {
        counts
            .entry(record.category.clone())
            .and_modify(|e| *e += 1)
            .or_insert(1);
    }

    let values: Vec<usize> = counts.values().copied().collect();
    let describe = describe(&values)?;

    Some(CategoryStats { counts, describe })
}

#[derive(Debug)]
pub(crate) struct Characteristics {
    /// Question length in characters.
    pub(crate) question_length: Describe,
    /// Answer A length in characters.
    pub(crate) answer_a_length: Describe,
    /// Answer B length in characters.
    pub(crate) answer_b_length: Describe,
    /// Number of whitespace separated words per question.
    pub(crate) word_count: Describe,
    /// The most common question starters.
    pub(crate) starters: Vec<(String, usize)>,
}

pub(crate) fn characteristics(
    records: &[QuestionRecord],
) -> Option<Characteristics> {
    let words: Vec<usize> = records
        .iter()
        .map(|r| r.question.split_whitespace().count())
        .collect();

    let question = lengths(records, |r| &r.question);
    let answer_a = lengths(records, |r| &r.answer_a);
    let answer_b = lengths(records, |r| &r.answer_b);

    Some(Characteristics {
        question_length: describe(&question)?,
        answer_a_length: describe(&answer_a)?,
        answer_b_length: describe(&answer_b)?,
        word_count: describe(&words)?,
        starters: starters(records, 3, 10),
    })
}

/// Returns the length (number of characters) of a field per record.
fn lengths<F>(records: &[QuestionRecord], field: F) -> Vec<usize>
where
    F: Fn(&QuestionRecord) -> &String,
{
    records.iter().map(|r| field(r).chars().count()).collect()
}

/// Returns the `limit` most common question starters, which consist of
/// the first `words` words of a question. Ties are ordered by first
/// occurrence.
pub(crate) fn starters(
    records: &[QuestionRecord],
    words: usize,
    limit: usize,
) -> Vec<(String, usize)> {
    let mut freqs = HashMap::<String, (usize, usize)>::new();

    for (idx, record) in records.iter().enumerate() {
        let starter = record
            .question
            .split_whitespace()
            .take(words)
            .collect::<Vec<_>>()
            .join(" ");

        if starter.is_empty() {
            continue;
        }

        freqs
            .entry(starter)
            .and_modify(|(count, _)| *count += 1)
            .or_insert((1, idx));
    }

    let mut starters: Vec<_> = freqs.into_iter().collect();
    starters.sort_by(|(_, (c1, i1)), (_, (c2, i2))| {
        c2.cmp(c1).then(i1.cmp(i2))
    });

    starters
        .into_iter()
        .take(limit)
        .map(|(starter, (count, _))| (starter, count))
        .collect()
}

#[derive(Debug, PartialEq)]
pub(crate) struct Theme {
    pub(crate) name: &'static str,
    pub(crate) count: usize,
    /// Share of all questions in percent.
    pub(crate) percentage: f64,
}

/// Counts the questions per keyword theme. Themes without any match
/// are omitted; the result is sorted by count (descending).
pub(crate) fn themes(records: &[QuestionRecord]) -> Vec<Theme> {
    if records.is_empty() {
        return vec![];
    }

    let questions: Vec<String> =
        records.iter().map(|r| r.question.to_lowercase()).collect();
    let total = questions.len() as f64;

    let mut themes: Vec<Theme> = THEMES
        .iter()
        .map(|&(name, keywords)| {
            let count = questions
                .iter()
                .filter(|q| keywords.iter().any(|kw| q.contains(kw)))
                .count();

            Theme {
                name,
                count,
                percentage: count as f64 / total * 100.0,
            }
        })
        .filter(|theme| theme.count > 0)
        .collect();

    themes.sort_by(|a, b| b.count.cmp(&a.count));
    themes
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn record(question: &str, category: &str) -> QuestionRecord {
        QuestionRecord {
            question: question.into(),
            answer_a: "Ja".into(),
            answer_b: "Nej tak".into(),
            category: category.into(),
        }
    }

    #[test]
    fn describe_odd() {
        let d = describe(&[3, 1, 2]).unwrap();
        assert_relative_eq!(d.mean, 2.0);
        assert_relative_eq!(d.median, 2.0);
        assert_relative_eq!(d.min, 1.0);
        assert_relative_eq!(d.max, 3.0);
        assert_relative_eq!(d.std, (2.0f64 / 3.0).sqrt());
    }

    #[test]
    fn describe_even() {
        let d = describe(&[4, 1, 2, 10]).unwrap();
        assert_relative_eq!(d.mean, 4.25);
        assert_relative_eq!(d.median, 3.0);
    }

    #[test]
    fn describe_empty() {
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn category_stats_balanced() {
        let mut records = vec![];
        for _ in 0..10 {
            records.push(record("q", "mad"));
            records.push(record("q", "arbejde"));
        }
        records.push(record("q", "mad"));

        let stats = category_stats(&records).unwrap();
        assert_eq!(stats.counts["mad"], 11);
        assert_eq!(stats.counts["arbejde"], 10);
        assert!(stats.is_balanced());
        assert_eq!(stats.well_represented(11), vec![("mad", 11)]);
    }

    #[test]
    fn category_stats_unbalanced() {
        let mut records = vec![record("q", "krop")];
        for _ in 0..10 {
            records.push(record("q", "mad"));
        }

        let stats = category_stats(&records).unwrap();
        assert_relative_eq!(stats.describe.mean, 5.5);
        assert_relative_eq!(stats.describe.std, 4.5);
        assert!(!stats.is_balanced());
        assert!(category_stats(&[]).is_none());
    }

    #[test]
    fn characteristics_ok() {
        let records = vec![
            record("Vil du hellere være rig?", "a"),
            record("Vil du hellere være glad?", "a"),
            record("Hvad vil du helst?", "b"),
        ];

        let c = characteristics(&records).unwrap();
        assert_relative_eq!(c.question_length.max, 25.0);
        assert_relative_eq!(c.question_length.min, 18.0);
        assert_relative_eq!(c.word_count.mean, 4.0);
        assert_relative_eq!(c.answer_a_length.mean, 2.0);
        assert_relative_eq!(c.answer_b_length.max, 7.0);
        assert_eq!(c.starters[0], ("Vil du hellere".to_string(), 2));
        assert_eq!(c.starters[1], ("Hvad vil du".to_string(), 1));
    }

    #[test]
    fn starters_ties_by_first_occurrence() {
        let records = vec![
            record("b c d e", "x"),
            record("a b c d", "x"),
            record("b c d f", "x"),
            record("a b c x", "x"),
            record("z", "x"),
        ];

        let starters = starters(&records, 3, 2);
        assert_eq!(starters, vec![
            ("b c d".to_string(), 2),
            ("a b c".to_string(), 2)
        ]);
    }

    #[test]
    fn themes_ok() {
        let records = vec![
            record("Vil du helst spise pizza eller burger?", "mad"),
            record("Vil du hellere have en ny chef?", "arbejde"),
            record("Xyz?", "andet"),
            record("Kaffe hver DAG?", "mad"),
        ];

        let themes = themes(&records);
        let names: Vec<&str> = themes.iter().map(|t| t.name).collect();
        assert_eq!(names, vec![
            "food",
            "choice_intensity",
            "arbejde",
            "time"
        ]);
        assert_eq!(themes[0].count, 2);
        assert_relative_eq!(themes[0].percentage, 50.0);
    }
}
