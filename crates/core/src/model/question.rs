use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// An answer key that cannot be mapped to an option index.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unrecognized answer key: {0:?}")]
pub struct AnswerKeyError(pub String);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("MCQ question needs at least two options, got {0}")]
    TooFewOptions(usize),

    #[error("correct option {index} is out of range for {options} options")]
    CorrectOutOfRange { index: usize, options: usize },

    #[error("question marks must be a positive finite number")]
    InvalidMarks,

    #[error(transparent)]
    AnswerKey(#[from] AnswerKeyError),
}

//
// ─── ANSWER KEY NORMALIZATION ─────────────────────────────────────────────────
//

/// Maps a letter or one-based numeric answer key to a zero-based option index.
///
/// Accepts `A`–`D` (either case) and `1`–`4`, surrounding whitespace ignored.
///
/// # Errors
///
/// Returns `AnswerKeyError` for anything else, including empty input.
pub fn normalize_answer_key(raw: &str) -> Result<usize, AnswerKeyError> {
    match raw.trim() {
        "A" | "a" | "1" => Ok(0),
        "B" | "b" | "2" => Ok(1),
        "C" | "c" | "3" => Ok(2),
        "D" | "d" | "4" => Ok(3),
        _ => Err(AnswerKeyError(raw.to_owned())),
    }
}

/// Correct-answer encoding as it may arrive from a content source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    /// Zero-based option index.
    Index(usize),
    /// Letter or one-based key, see [`normalize_answer_key`].
    Key(String),
}

impl CorrectAnswer {
    /// Resolve to a zero-based option index.
    ///
    /// # Errors
    ///
    /// Returns `AnswerKeyError` if a key form cannot be normalized.
    pub fn resolve(&self) -> Result<usize, AnswerKeyError> {
        match self {
            CorrectAnswer::Index(i) => Ok(*i),
            CorrectAnswer::Key(k) => normalize_answer_key(k),
        }
    }
}

//
// ─── QUESTION VARIANTS ────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Mcq,
    Written,
}

impl QuestionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Mcq => "mcq",
            QuestionKind::Written => "written",
        }
    }
}

/// Single-answer multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqQuestion {
    id: QuestionId,
    prompt: String,
    options: Vec<String>,
    correct: usize,
}

impl McqQuestion {
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, fewer than two options are
    /// given, or the correct answer does not address one of the options.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: &CorrectAnswer,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into().trim().to_owned();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions(options.len()));
        }
        let correct = correct.resolve()?;
        if correct >= options.len() {
            return Err(QuestionError::CorrectOutOfRange {
                index: correct,
                options: options.len(),
            });
        }

        Ok(Self {
            id,
            prompt,
            options,
            correct,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        self.correct == selected
    }
}

/// Free-form question answered by uploading images of handwritten work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrittenQuestion {
    id: QuestionId,
    prompt: String,
    marks: f64,
}

impl WrittenQuestion {
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank or marks are not positive.
    pub fn new(id: QuestionId, prompt: impl Into<String>, marks: f64) -> Result<Self, QuestionError> {
        let prompt = prompt.into().trim().to_owned();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if !marks.is_finite() || marks <= 0.0 {
            return Err(QuestionError::InvalidMarks);
        }
        Ok(Self { id, prompt, marks })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn marks(&self) -> f64 {
        self.marks
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Question {
    Mcq(McqQuestion),
    Written(WrittenQuestion),
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        match self {
            Question::Mcq(q) => q.id(),
            Question::Written(q) => q.id(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            Question::Mcq(_) => QuestionKind::Mcq,
            Question::Written(_) => QuestionKind::Written,
        }
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        match self {
            Question::Mcq(q) => q.prompt(),
            Question::Written(q) => q.prompt(),
        }
    }

    #[must_use]
    pub fn as_mcq(&self) -> Option<&McqQuestion> {
        match self {
            Question::Mcq(q) => Some(q),
            Question::Written(_) => None,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
