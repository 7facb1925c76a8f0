use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use polars::prelude::*;

use crate::error::{DatasetError, DatasetResult};
use crate::record::QuestionRecord;

/// A line that was skipped by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Skipped {
    pub(crate) path: PathBuf,
    /// 1-based line number.
    pub(crate) line: usize,
    pub(crate) reason: String,
}

/// The records of all category files of a directory, in file-then-line
/// order, together with the diagnostics of the load.
#[derive(Debug)]
pub(crate) struct Dataset {
    /// The directory the dataset was loaded from.
    source: PathBuf,
    records: Vec<QuestionRecord>,
    skipped: Vec<Skipped>,
}

impl Dataset {
    pub(crate) fn new<P: Into<PathBuf>>(
        source: P,
        records: Vec<QuestionRecord>,
        skipped: Vec<Skipped>,
    ) -> Self {
        Self {
            source: source.into(),
            records,
            skipped,
        }
    }

    #[inline]
    pub(crate) fn source(&self) -> &Path {
        &self.source
    }

    #[inline]
    pub(crate) fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the malformed lines, which were skipped while loading.
    #[inline]
    pub(crate) fn skipped(&self) -> &[Skipped] {
        &self.skipped
    }

    /// Returns the number of records with at least one blank field.
    pub(crate) fn blank(&self) -> usize {
        self.records.iter().filter(|r| r.is_blank()).count()
    }

    /// Returns the sorted set of categories.
    pub(crate) fn categories(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.category.as_str()).collect()
    }

    /// Groups the records by category. Within a category the load
    /// order is preserved.
    pub(crate) fn by_category(
        &self,
    ) -> BTreeMap<&str, Vec<&QuestionRecord>> {
        let mut groups: BTreeMap<&str, Vec<&QuestionRecord>> =
            BTreeMap::new();

        for record in self.records.iter() {
            groups
                .entry(record.category.as_str())
                .or_default()
                .push(record);
        }

        groups
    }

    /// Fails with [DatasetError::EmptyDataset] if no records were
    /// loaded.
    pub(crate) fn ensure_not_empty(self) -> DatasetResult<Self> {
        if self.records.is_empty() {
            return Err(DatasetError::EmptyDataset {
                path: self.source,
            });
        }

        Ok(self)
    }

    /// Writes the records as line-delimited JSON.
    pub(crate) fn write_jsonl<W: Write>(
        &self,
        mut wtr: W,
    ) -> DatasetResult<()> {
        for record in self.records.iter() {
            serde_json::to_writer(&mut wtr, record)?;
            wtr.write_all(b"\n")?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Returns the records as line-delimited JSON.
    pub(crate) fn to_jsonl(&self) -> DatasetResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_jsonl(&mut buf)?;
        Ok(buf)
    }

    /// Returns the records as a data frame with the columns
    /// `question`, `answer_A`, `answer_B` and `category`.
    pub(crate) fn to_frame(&self) -> DatasetResult<DataFrame> {
        let mut question: Vec<&str> = vec![];
        let mut answer_a: Vec<&str> = vec![];
        let mut answer_b: Vec<&str> = vec![];
        let mut category: Vec<&str> = vec![];

        for record in self.records.iter() {
            question.push(&record.question);
            answer_a.push(&record.answer_a);
            answer_b.push(&record.answer_b);
            category.push(&record.category);
        }

        Ok(DataFrame::new(vec![
            Series::new("question", question),
            Series::new("answer_A", answer_a),
            Series::new("answer_B", answer_b),
            Series::new("category", category),
        ])?)
    }

    /// Returns the number of questions, unique questions and
    /// duplicates per category, sorted by category.
    pub(crate) fn category_frame(&self) -> DatasetResult<DataFrame> {
        let df = self
            .to_frame()?
            .lazy()
            .group_by([col("category")])
            .agg([
                col("question").count().alias("questions"),
                col("question").n_unique().alias("unique"),
            ])
            .with_columns([
                (col("questions") - col("unique")).alias("duplicates")
            ])
            .select([
                col("category"),
                col("questions").cast(DataType::UInt64),
                col("unique").cast(DataType::UInt64),
                col("duplicates").cast(DataType::UInt64),
            ])
            .sort(["category"], Default::default())
            .collect()?;

        Ok(df)
    }
}
