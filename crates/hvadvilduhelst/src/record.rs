use serde::{Deserialize, Serialize};

/// A single binary-choice question ("would you rather").
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub(crate) struct QuestionRecord {
    /// The prompt presented to a respondent.
    pub(crate) question: String,

    /// The first option.
    #[serde(rename = "answer_A")]
    pub(crate) answer_a: String,

    /// The second option.
    #[serde(rename = "answer_B")]
    pub(crate) answer_b: String,

    /// The category, derived from the name of the source file.
    pub(crate) category: String,
}

/// The shape of a single line in a category file. Additional keys are
/// ignored.
#[derive(Debug, Deserialize)]
struct Line {
    question: String,
    #[serde(rename = "answer_A")]
    answer_a: String,
    #[serde(rename = "answer_B")]
    answer_b: String,
}

impl QuestionRecord {
    /// Parses one line of a category file and tags it with `category`.
    pub(crate) fn from_line(
        line: &str,
        category: &str,
    ) -> Result<Self, serde_json::Error> {
        let Line {
            question,
            answer_a,
            answer_b,
        } = serde_json::from_str(line)?;

        Ok(Self {
            question,
            answer_a,
            answer_b,
            category: category.into(),
        })
    }

    /// Returns `true` if any of the text fields is empty after
    /// trimming whitespace.
    pub(crate) fn is_blank(&self) -> bool {
        self.question.trim().is_empty()
            || self.answer_a.trim().is_empty()
            || self.answer_b.trim().is_empty()
    }
}
