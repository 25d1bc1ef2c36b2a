use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::ids::QuestionId;
use crate::model::question::{Question, QuestionKind};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("question {0} is not part of this exam")]
    UnknownQuestion(QuestionId),

    #[error("question {id} is a {actual} question, expected {expected}")]
    WrongVariant {
        id: QuestionId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("question {id} accepts at most {max} images, {attempted} given")]
    TooManyImages {
        id: QuestionId,
        max: usize,
        attempted: usize,
    },
}

//
// ─── IMAGES ───────────────────────────────────────────────────────────────────
//

/// Local object reference for an uploaded image.
///
/// Only meaningful for the lifetime of the session that minted it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Mint a fresh `blob:` reference.
    #[must_use]
    pub fn mint() -> Self {
        Self(format!("blob:local/{}", Uuid::new_v4()))
    }

    #[must_use]
    pub fn from_persisted(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file picked by the user, before a local reference exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub size_bytes: u64,
}

impl ImageFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            file_name: file_name.into(),
            size_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub file_name: String,
    pub size_bytes: u64,
    pub local_ref: ImageRef,
}

impl UploadedImage {
    #[must_use]
    pub fn from_file(file: ImageFile) -> Self {
        Self {
            file_name: file.file_name,
            size_bytes: file.size_bytes,
            local_ref: ImageRef::mint(),
        }
    }
}

//
// ─── ANSWERS ──────────────────────────────────────────────────────────────────
//

/// Per-question answer state, tagged by the question variant it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Mcq(Option<usize>),
    Written(Vec<UploadedImage>),
}

impl Answer {
    #[must_use]
    pub fn empty_for(kind: QuestionKind) -> Self {
        match kind {
            QuestionKind::Mcq => Answer::Mcq(None),
            QuestionKind::Written => Answer::Written(Vec::new()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            Answer::Mcq(_) => QuestionKind::Mcq,
            Answer::Written(_) => QuestionKind::Written,
        }
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        match self {
            Answer::Mcq(selected) => selected.is_some(),
            Answer::Written(images) => !images.is_empty(),
        }
    }
}

/// Answers for every question of an exam, keyed by question id.
///
/// Entries are created once from the question list; later calls only update
/// existing entries of the matching variant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerSheet {
    answers: HashMap<QuestionId, Answer>,
}

impl AnswerSheet {
    #[must_use]
    pub fn for_questions(questions: &[Question]) -> Self {
        let answers = questions
            .iter()
            .map(|q| (q.id(), Answer::empty_for(q.kind())))
            .collect();
        Self { answers }
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Answer> {
        self.answers.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.values().filter(|a| a.is_answered()).count()
    }

    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.len() - self.answered_count()
    }

    /// Selected option for an MCQ question, `None` when skipped or unknown.
    #[must_use]
    pub fn selected(&self, id: QuestionId) -> Option<usize> {
        match self.answers.get(&id) {
            Some(Answer::Mcq(selected)) => *selected,
            _ => None,
        }
    }

    #[must_use]
    pub fn images(&self, id: QuestionId) -> &[UploadedImage] {
        match self.answers.get(&id) {
            Some(Answer::Written(images)) => images,
            _ => &[],
        }
    }

    /// Record an MCQ selection, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError` for unknown ids or non-MCQ questions.
    pub fn select(&mut self, id: QuestionId, option: usize) -> Result<(), AnswerError> {
        match self.answers.get_mut(&id) {
            Some(Answer::Mcq(selected)) => {
                *selected = Some(option);
                Ok(())
            }
            Some(other) => Err(AnswerError::WrongVariant {
                id,
                expected: QuestionKind::Mcq.as_str(),
                actual: other.kind().as_str(),
            }),
            None => Err(AnswerError::UnknownQuestion(id)),
        }
    }

    /// Append uploads to a written question. Earlier uploads are kept.
    ///
    /// `max` caps the total number of images for the question; the whole batch
    /// is rejected if it would exceed the cap.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError` for unknown ids, non-written questions, or a cap
    /// violation.
    pub fn append_images(
        &mut self,
        id: QuestionId,
        uploads: Vec<UploadedImage>,
        max: Option<usize>,
    ) -> Result<usize, AnswerError> {
        match self.answers.get_mut(&id) {
            Some(Answer::Written(images)) => {
                let attempted = images.len() + uploads.len();
                if let Some(max) = max {
                    if attempted > max {
                        return Err(AnswerError::TooManyImages { id, max, attempted });
                    }
                }
                images.extend(uploads);
                Ok(images.len())
            }
            Some(other) => Err(AnswerError::WrongVariant {
                id,
                expected: QuestionKind::Written.as_str(),
                actual: other.kind().as_str(),
            }),
            None => Err(AnswerError::UnknownQuestion(id)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &Answer)> {
        self.answers.iter().map(|(id, a)| (*id, a))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
