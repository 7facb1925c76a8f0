use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use indicatif::ParallelProgressIterator;
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Skipped};
use crate::error::{DatasetError, DatasetResult};
use crate::progress::ProgressBarBuilder;
use crate::record::QuestionRecord;

/// File extensions of category files.
pub(crate) const EXTENSIONS: [&str; 2] = ["jsonl", "ndjson"];

const PBAR_LOAD: &str =
    "Loading category files: {human_pos} ({percent}%) | \
        elapsed: {elapsed_precise}{msg}";

/// What to do with a line that doesn't match the record schema.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum ValidationPolicy {
    /// Skip the line and report it with the dataset.
    #[default]
    Skip,
    /// Abort the load with the first malformed line.
    FailFast,
}

#[derive(Debug, Default)]
struct Batch {
    records: Vec<QuestionRecord>,
    skipped: Vec<Skipped>,
}

/// Reads a directory of category files into a [Dataset].
#[derive(Debug, Default, Clone)]
pub(crate) struct Loader {
    policy: ValidationPolicy,
    quiet: bool,
}

impl Loader {
    pub(crate) fn new(policy: ValidationPolicy) -> Self {
        Self {
            policy,
            quiet: false,
        }
    }

    /// Whether to hide the progress bar or not.
    pub(crate) fn quiet(mut self, yes: bool) -> Self {
        self.quiet = yes;
        self
    }

    /// Loads all category files of the directory `dir`.
    ///
    /// Each file `<category>.jsonl` (or `.ndjson`) contributes one
    /// record per non-blank line, tagged with the file stem as
    /// category. Files are processed in sorted order and the records
    /// of a file keep their line order.
    ///
    /// This function fails with [DatasetError::DirectoryNotFound], if
    /// `dir` isn't a directory. An existing directory without
    /// category files results in an empty dataset.
    pub(crate) fn load<P: AsRef<Path>>(
        &self,
        dir: P,
    ) -> DatasetResult<Dataset> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(DatasetError::DirectoryNotFound {
                path: dir.into(),
            });
        }

        let files = category_files(dir)?;
        debug!(
            "found {} category file(s) in {}",
            files.len(),
            dir.display()
        );

        let pbar = ProgressBarBuilder::new(PBAR_LOAD, self.quiet)
            .len(files.len() as u64)
            .build();

        // The batches are collected in file order, so that the first
        // error (fail-fast) doesn't depend on the scheduling.
        let batches: Vec<DatasetResult<Batch>> = files
            .par_iter()
            .progress_with(pbar)
            .map(|path| self.read_file(path))
            .collect();

        let mut records = vec![];
        let mut skipped = vec![];

        for batch in batches.into_iter() {
            let batch = batch?;
            records.extend(batch.records);
            skipped.extend(batch.skipped);
        }

        if !skipped.is_empty() {
            warn!(
                "skipped {} malformed line(s) in {}",
                skipped.len(),
                dir.display()
            );
        }

        Ok(Dataset::new(dir, records, skipped))
    }

    /// Tries the candidate directories in order and returns the first
    /// dataset that could be loaded.
    ///
    /// Only a [DatasetError::DirectoryNotFound] moves on to the next
    /// candidate; every other error is returned immediately. If no
    /// candidate exists, the error of the last one is returned.
    pub(crate) fn load_first<P: AsRef<Path>>(
        &self,
        candidates: &[P],
    ) -> DatasetResult<Dataset> {
        let mut last = None;

        for candidate in candidates.iter() {
            match self.load(candidate) {
                Err(e @ DatasetError::DirectoryNotFound { .. }) => {
                    debug!("{e}");
                    last = Some(e);
                }
                result => return result,
            }
        }

        Err(last.unwrap_or_else(|| {
            DatasetError::config("no dataset directory configured")
        }))
    }

    fn read_file(&self, path: &Path) -> DatasetResult<Batch> {
        let category = category_of(path);
        let file = File::open(path).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("cannot open {}: {e}", path.display()),
            )
        })?;

        let reader = BufReader::new(file);
        let mut batch = Batch::default();

        for (idx, buf) in reader.split(b'\n').enumerate() {
            let buf = buf?;
            let line = idx + 1;

            let result = std::str::from_utf8(&buf)
                .map_err(|_| "invalid UTF-8".to_string())
                .and_then(|s| {
                    let s = s.trim_start_matches('\u{feff}');
                    if s.trim().is_empty() {
                        return Ok(None);
                    }

                    QuestionRecord::from_line(s, &category)
                        .map(Some)
                        .map_err(|e| e.to_string())
                });

            match result {
                Ok(Some(record)) => batch.records.push(record),
                Ok(None) => continue,
                Err(reason) => match self.policy {
                    ValidationPolicy::FailFast => {
                        return Err(DatasetError::MalformedRecord {
                            path: path.into(),
                            line,
                            reason,
                        });
                    }
                    ValidationPolicy::Skip => {
                        warn!(
                            "skipping {}, line {line}: {reason}",
                            path.display()
                        );

                        batch.skipped.push(Skipped {
                            path: path.into(),
                            line,
                            reason,
                        });
                    }
                },
            }
        }

        debug!(
            "loaded {} record(s) from {} (category = {category})",
            batch.records.len(),
            path.display()
        );

        Ok(batch)
    }
}

/// Returns the category files of `dir` in sorted order.
///
/// Errors while reading the directory are propagated. Entries with a
/// category file extension are kept unless they are directories; a
/// dangling link fails later when the file is opened.
fn category_files(dir: &Path) -> DatasetResult<Vec<PathBuf>> {
    let mut files = vec![];

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_category_file = path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| EXTENSIONS.contains(&ext));

        if is_category_file && !path.is_dir() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Derives the category from the file name (without extension).
#[inline]
pub(crate) fn category_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::{tempdir, TempDir};

    use super::*;

    type TestResult = anyhow::Result<()>;

    fn line(question: &str) -> String {
        format!(
            r#"{{"question":"{question}","answer_A":"A","answer_B":"B"}}"#
        )
    }

    fn fixture(files: &[(&str, Vec<String>)]) -> anyhow::Result<TempDir> {
        let dir = tempdir()?;
        for (name, lines) in files {
            let mut content = lines.join("\n");
            content.push('\n');
            fs::write(dir.path().join(name), content)?;
        }

        Ok(dir)
    }

    fn sorted(dataset: &Dataset) -> Vec<QuestionRecord> {
        let mut records = dataset.records().to_vec();
        records.sort();
        records
    }

    fn loader() -> Loader {
        Loader::new(ValidationPolicy::Skip).quiet(true)
    }

    #[test]
    fn category_of_ok() {
        assert_eq!(category_of(Path::new("/tmp/data/work.jsonl")), "work");
        assert_eq!(category_of(Path::new("mad.ndjson")), "mad");
    }

    #[test]
    fn load_example_scenario() -> TestResult {
        let dir = fixture(&[(
            "mad.jsonl",
            vec![r#"{"question":"Vil du hellere altid spise varm mad eller altid spise kold mad?","answer_A":"Varm mad","answer_B":"Kold mad"}"#.into()],
        )])?;

        let dataset = loader().load(dir.path())?;
        assert_eq!(dataset.records(), &[QuestionRecord {
            question: "Vil du hellere altid spise varm mad eller altid \
                spise kold mad?"
                .into(),
            answer_a: "Varm mad".into(),
            answer_b: "Kold mad".into(),
            category: "mad".into(),
        }]);
        assert!(dataset.skipped().is_empty());
        Ok(())
    }

    #[test]
    fn load_category_derivation_and_counts() -> TestResult {
        let work = (0..12).map(|i| line(&format!("work {i}"))).collect();
        let family =
            (0..7).map(|i| line(&format!("family {i}"))).collect();
        let dir = fixture(&[
            ("work.jsonl", work),
            ("family.jsonl", family),
            ("notes.txt", vec!["not a category".into()]),
        ])?;

        let dataset = loader().load(dir.path())?;
        assert_eq!(dataset.len(), 19);

        let groups = dataset.by_category();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["work"].len(), 12);
        assert_eq!(groups["family"].len(), 7);

        for record in dataset.records() {
            assert!(!record.question.is_empty());
            assert!(!record.answer_a.is_empty());
            assert!(!record.answer_b.is_empty());
            assert!(record.question.starts_with(&record.category));
        }

        Ok(())
    }

    #[test]
    fn load_keeps_line_order_within_category() -> TestResult {
        let lines = (0..5).map(|i| line(&format!("q{i}"))).collect();
        let dir = fixture(&[("mad.jsonl", lines)])?;

        let dataset = loader().load(dir.path())?;
        let questions: Vec<&str> = dataset
            .records()
            .iter()
            .map(|r| r.question.as_str())
            .collect();

        assert_eq!(questions, vec!["q0", "q1", "q2", "q3", "q4"]);
        Ok(())
    }

    #[test]
    fn load_ndjson_and_blank_lines() -> TestResult {
        let dir = fixture(&[
            ("mad.ndjson", vec![line("a"), "".into(), "   ".into()]),
            ("krop.jsonl", vec![line("b")]),
        ])?;

        let dataset = loader().load(dir.path())?;
        assert_eq!(dataset.len(), 2);
        assert!(dataset.skipped().is_empty());
        assert_eq!(
            dataset.categories().into_iter().collect::<Vec<_>>(),
            vec!["krop", "mad"]
        );
        Ok(())
    }

    #[test]
    fn load_empty_directory() -> TestResult {
        let dir = tempdir()?;
        let dataset = loader().load(dir.path())?;

        assert!(dataset.is_empty());
        assert!(matches!(
            dataset.ensure_not_empty(),
            Err(DatasetError::EmptyDataset { .. })
        ));
        Ok(())
    }

    #[test]
    fn load_missing_directory() -> TestResult {
        let dir = tempdir()?;
        let missing = dir.path().join("missing");

        let result = loader().load(&missing);
        assert!(matches!(
            result,
            Err(DatasetError::DirectoryNotFound { ref path })
                if *path == missing
        ));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn load_non_utf8_directory() -> TestResult {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = tempdir()?;
        let dir = root.path().join(OsStr::from_bytes(b"hyg\xffdk"));
        fs::create_dir(&dir)?;
        fs::write(dir.join("mad.jsonl"), line("Kaffe eller te?") + "\n")?;

        let dataset = loader().load(&dir)?;
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].category, "mad");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn load_dangling_link() -> TestResult {
        let dir = fixture(&[("krop.jsonl", vec![line("a")])])?;
        std::os::unix::fs::symlink(
            dir.path().join("missing.jsonl"),
            dir.path().join("mad.jsonl"),
        )?;

        assert!(matches!(
            loader().load(dir.path()),
            Err(DatasetError::IO(ref e))
                if e.kind() == std::io::ErrorKind::NotFound
        ));
        Ok(())
    }

    #[test]
    fn load_ignores_other_entries() -> TestResult {
        let dir = fixture(&[
            ("mad.jsonl", vec![line("a")]),
            ("README.md", vec!["# hygdk".into()]),
        ])?;
        fs::create_dir(dir.path().join("old.jsonl"))?;

        let dataset = loader().load(dir.path())?;
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.categories().into_iter().collect::<Vec<_>>(), vec![
            "mad"
        ]);
        Ok(())
    }

    #[test]
    fn load_file_is_not_a_directory() -> TestResult {
        let dir = fixture(&[("mad.jsonl", vec![line("a")])])?;
        let result = loader().load(dir.path().join("mad.jsonl"));

        assert!(matches!(
            result,
            Err(DatasetError::DirectoryNotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn load_skip_malformed() -> TestResult {
        let dir = fixture(&[(
            "mad.jsonl",
            vec![
                line("ok"),
                r#"{"question":"q","answer_A":"A"}"#.into(),
            ],
        )])?;

        let loader = loader();
        let first = loader.load(dir.path())?;
        let second = loader.load(dir.path())?;

        assert_eq!(first.len(), 1);
        assert_eq!(first.skipped().len(), 1);
        assert_eq!(first.skipped()[0].line, 2);
        assert!(first.skipped()[0].reason.contains("answer_B"));

        assert_eq!(first.records(), second.records());
        assert_eq!(first.skipped(), second.skipped());
        Ok(())
    }

    #[test]
    fn load_fail_fast() -> TestResult {
        let dir = fixture(&[
            ("a.jsonl", vec![line("ok"), "{".into()]),
            ("b.jsonl", vec![r#"{"question":"q"}"#.into()]),
        ])?;

        let loader =
            Loader::new(ValidationPolicy::FailFast).quiet(true);
        let first = loader.load(dir.path()).unwrap_err().to_string();
        let second = loader.load(dir.path()).unwrap_err().to_string();

        assert_eq!(first, second);
        assert!(first.contains("a.jsonl"), "{first}");
        assert!(first.contains("line 2"), "{first}");

        let result = loader.load(dir.path());
        assert!(matches!(
            result,
            Err(DatasetError::MalformedRecord { line: 2, .. })
        ));
        Ok(())
    }

    #[test]
    fn load_invalid_utf8_is_malformed() -> TestResult {
        let dir = tempdir()?;
        let mut content = line("ok").into_bytes();
        content.extend_from_slice(b"\n\xff\xfe\n");
        fs::write(dir.path().join("mad.jsonl"), content)?;

        let dataset = loader().load(dir.path())?;
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.skipped().len(), 1);
        assert_eq!(dataset.skipped()[0].reason, "invalid UTF-8");
        Ok(())
    }

    #[test]
    fn load_crlf_and_bom() -> TestResult {
        let dir = tempdir()?;
        let content = format!("\u{feff}{}\r\n{}\r\n", line("a"), line("b"));
        fs::write(dir.path().join("mad.jsonl"), content)?;

        let dataset = loader().load(dir.path())?;
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0].question, "a");
        Ok(())
    }

    #[test]
    fn load_is_idempotent() -> TestResult {
        let dir = fixture(&[
            ("work.jsonl", vec![line("w1"), line("w2"), line("w1")]),
            ("family.jsonl", vec![line("f1")]),
        ])?;

        let loader = loader();
        let first = loader.load(dir.path())?;
        let second = loader.load(dir.path())?;

        assert_eq!(sorted(&first), sorted(&second));
        assert_eq!(first.by_category(), second.by_category());
        Ok(())
    }

    #[test]
    fn load_first_falls_back() -> TestResult {
        let dir = fixture(&[("mad.jsonl", vec![line("a")])])?;
        let missing = dir.path().join("missing");

        let dataset = loader()
            .load_first(&[missing.as_path(), dir.path()])?;
        assert_eq!(dataset.source(), dir.path());
        assert_eq!(dataset.len(), 1);
        Ok(())
    }

    #[test]
    fn load_first_propagates_last_error() -> TestResult {
        let dir = tempdir()?;
        let first = dir.path().join("first");
        let last = dir.path().join("last");

        let result = loader().load_first(&[&first, &last]);
        assert!(matches!(
            result,
            Err(DatasetError::DirectoryNotFound { ref path })
                if *path == last
        ));

        let result = loader().load_first::<PathBuf>(&[]);
        assert!(matches!(result, Err(DatasetError::Configuration(_))));
        Ok(())
    }

    #[test]
    fn load_first_stops_on_malformed() -> TestResult {
        let bad = fixture(&[("mad.jsonl", vec!["{".into()])])?;
        let good = fixture(&[("mad.jsonl", vec![line("a")])])?;

        let loader =
            Loader::new(ValidationPolicy::FailFast).quiet(true);
        let result = loader.load_first(&[bad.path(), good.path()]);

        assert!(matches!(
            result,
            Err(DatasetError::MalformedRecord { .. })
        ));
        Ok(())
    }
}
