use std::collections::{BTreeMap, HashSet};
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::record::QuestionRecord;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum IssueKind {
    /// The question text occurred earlier in the dataset.
    DuplicateQuestion,
    /// The question is shorter than the configured minimum.
    VeryShortQuestion,
    /// The question is longer than the configured maximum.
    VeryLongQuestion,
    /// Both answers are identical.
    DuplicateAnswers,
    /// At least one of the text fields is blank.
    MissingContent,
}

impl IssueKind {
    pub(crate) const ALL: [IssueKind; 5] = [
        Self::DuplicateQuestion,
        Self::VeryShortQuestion,
        Self::VeryLongQuestion,
        Self::DuplicateAnswers,
        Self::MissingContent,
    ];

    /// A human-readable title.
    pub(crate) fn title(&self) -> &'static str {
        match self {
            Self::DuplicateQuestion => "Duplicate questions",
            Self::VeryShortQuestion => "Very short questions",
            Self::VeryLongQuestion => "Very long questions",
            Self::DuplicateAnswers => "Duplicate answers",
            Self::MissingContent => "Missing content",
        }
    }
}

impl Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DuplicateQuestion => "duplicate-question",
            Self::VeryShortQuestion => "very-short-question",
            Self::VeryLongQuestion => "very-long-question",
            Self::DuplicateAnswers => "duplicate-answers",
            Self::MissingContent => "missing-content",
        };

        f.write_str(s)
    }
}

/// Length bounds (in characters) of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub(crate) struct Thresholds {
    pub(crate) min_question_length: usize,
    pub(crate) max_question_length: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_question_length: 20,
            max_question_length: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Issue<'a> {
    pub(crate) kind: IssueKind,
    /// Position of the record in the dataset.
    pub(crate) index: usize,
    pub(crate) category: &'a str,
    pub(crate) question: &'a str,
}

#[derive(Debug, Default)]
pub(crate) struct Report<'a> {
    issues: Vec<Issue<'a>>,
}

impl<'a> Report<'a> {
    #[inline]
    pub(crate) fn issues(&self) -> &[Issue<'a>] {
        &self.issues
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.issues.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns all issues of the given kind in dataset order.
    pub(crate) fn of_kind(
        &self,
        kind: IssueKind,
    ) -> impl Iterator<Item = &Issue<'a>> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }

    /// Returns the number of issues per kind; kinds without issues
    /// are omitted.
    pub(crate) fn counts(&self) -> BTreeMap<IssueKind, usize> {
        self.issues.iter().fold(BTreeMap::new(), |mut acc, issue| {
            acc.entry(issue.kind)
                .and_modify(|e| *e += 1)
                .or_insert(1);
            acc
        })
    }
}

/// Checks every record for potential quality issues.
pub(crate) fn assess<'a>(
    records: &'a [QuestionRecord],
    thresholds: &Thresholds,
) -> Report<'a> {
    let mut seen = HashSet::<&str>::new();
    let mut issues = vec![];

    for (index, record) in records.iter().enumerate() {
        let question = record.question.as_str();
        let mut push = |kind| {
            issues.push(Issue {
                kind,
                index,
                category: &record.category,
                question,
            })
        };

        if !seen.insert(question) {
            push(IssueKind::DuplicateQuestion);
        }

        let len = question.chars().count();
        if len < thresholds.min_question_length {
            push(IssueKind::VeryShortQuestion);
        } else if len > thresholds.max_question_length {
            push(IssueKind::VeryLongQuestion);
        }

        if record.answer_a == record.answer_b {
            push(IssueKind::DuplicateAnswers);
        }

        if record.is_blank() {
            push(IssueKind::MissingContent);
        }
    }

    Report { issues }
}
