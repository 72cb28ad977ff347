//! Question content and answer grading.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discriminant shared by questions and answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    /// Pick one option from a list.
    MultipleChoice,
    /// Type a short free-form answer.
    FillInBlank,
    /// Arrange items into the correct sequence.
    Ordering,
}

/// Quiz question payload attached to a lesson.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Question {
    /// Question answered by selecting one of `options`.
    MultipleChoice {
        /// Text shown to the learner.
        prompt: String,
        /// Options in display order.
        options: Vec<String>,
        /// Index of the correct option.
        correct: usize,
    },
    /// Question answered by typing text.
    FillInBlank {
        /// Text shown to the learner.
        prompt: String,
        /// Every spelling accepted as correct.
        accepted: Vec<String>,
    },
    /// Question answered by arranging `items`.
    Ordering {
        /// Text shown to the learner.
        prompt: String,
        /// Items in display order.
        items: Vec<String>,
        /// Indices into `items` listed in the correct sequence.
        correct_order: Vec<usize>,
    },
}

impl Question {
    /// Kind of answer the question expects.
    #[must_use]
    pub const fn kind(&self) -> QuestionKind {
        match self {
            Self::MultipleChoice { .. } => QuestionKind::MultipleChoice,
            Self::FillInBlank { .. } => QuestionKind::FillInBlank,
            Self::Ordering { .. } => QuestionKind::Ordering,
        }
    }

    /// Text shown to the learner.
    #[must_use]
    pub fn prompt(&self) -> &str {
        match self {
            Self::MultipleChoice { prompt, .. }
            | Self::FillInBlank { prompt, .. }
            | Self::Ordering { prompt, .. } => prompt,
        }
    }

    /// Answer that this question grades as correct.
    ///
    /// Fill-in-the-blank questions without accepted spellings have no
    /// correct answer.
    #[must_use]
    pub fn expected_answer(&self) -> Option<Answer> {
        match self {
            Self::MultipleChoice { correct, .. } => Some(Answer::Choice(*correct)),
            Self::FillInBlank { accepted, .. } => accepted.first().cloned().map(Answer::Text),
            Self::Ordering { correct_order, .. } => Some(Answer::Order(correct_order.clone())),
        }
    }
}

/// Response submitted by a learner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    /// Index of the chosen option.
    Choice(usize),
    /// Typed text.
    Text(String),
    /// Indices into the question's items in the submitted sequence.
    Order(Vec<usize>),
}

impl Answer {
    /// Kind of question this answer responds to.
    #[must_use]
    pub const fn kind(&self) -> QuestionKind {
        match self {
            Self::Choice(_) => QuestionKind::MultipleChoice,
            Self::Text(_) => QuestionKind::FillInBlank,
            Self::Order(_) => QuestionKind::Ordering,
        }
    }
}

/// Errors raised when an answer cannot be graded.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GradeError {
    /// The answer responds to a different kind of question.
    #[error("expected a {expected:?} answer but received {found:?}")]
    KindMismatch {
        /// Kind the question expects.
        expected: QuestionKind,
        /// Kind that was submitted.
        found: QuestionKind,
    },
    /// The chosen option does not exist.
    #[error("option {choice} is out of range for {options} options")]
    ChoiceOutOfRange {
        /// Submitted option index.
        choice: usize,
        /// Number of options offered.
        options: usize,
    },
    /// The submitted sequence is not a permutation of the items.
    #[error("submitted order is not a permutation of {items} items")]
    InvalidOrder {
        /// Number of items offered.
        items: usize,
    },
    /// No question is awaiting an answer.
    #[error("quiz session is not accepting answers")]
    SessionInactive,
}

/// Grades `answer` against `question`.
pub fn grade(question: &Question, answer: &Answer) -> Result<bool, GradeError> {
    match (question, answer) {
        (Question::MultipleChoice { options, correct, .. }, Answer::Choice(choice)) => {
            if *choice >= options.len() {
                return Err(GradeError::ChoiceOutOfRange {
                    choice: *choice,
                    options: options.len(),
                });
            }
            Ok(choice == correct)
        }
        (Question::FillInBlank { accepted, .. }, Answer::Text(text)) => {
            let submitted = normalize(text);
            Ok(accepted
                .iter()
                .any(|candidate| normalize(candidate) == submitted))
        }
        (
            Question::Ordering {
                items,
                correct_order,
                ..
            },
            Answer::Order(order),
        ) => {
            if !is_permutation(order, items.len()) {
                return Err(GradeError::InvalidOrder { items: items.len() });
            }
            Ok(order == correct_order)
        }
        (question, answer) => Err(GradeError::KindMismatch {
            expected: question.kind(),
            found: answer.kind(),
        }),
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }

    let mut seen = vec![false; len];
    for &index in order {
        match seen.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}
