#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure quiz system that grades answers and emits lesson progress commands.

mod question;

use almanac_core::{Command, Event, LearnerId, LessonId};

pub use question::{grade, Answer, GradeError, Question, QuestionKind};

const DEFAULT_PASS_THRESHOLD: f32 = 0.8;

/// Configuration parameters required to construct a quiz session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    pass_threshold: f32,
}

impl Config {
    /// Creates a configuration requiring `pass_threshold` of answers to be correct.
    ///
    /// The threshold is clamped into `0.0..=1.0`.
    #[must_use]
    pub fn new(pass_threshold: f32) -> Self {
        Self {
            pass_threshold: pass_threshold.clamp(0.0, 1.0),
        }
    }

    /// Share of correct answers required to pass.
    #[must_use]
    pub const fn pass_threshold(&self) -> f32 {
        self.pass_threshold
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_PASS_THRESHOLD)
    }
}

/// Lifecycle of a quiz session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// Waiting for the world to confirm the lesson started.
    Waiting,
    /// Accepting answers.
    Active,
    /// Every question was answered or the learner ran out of hearts.
    Finished {
        /// Whether the learner passed.
        passed: bool,
    },
}

/// Aggregated view of session progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionProgress {
    /// Number of questions in the lesson.
    pub total: usize,
    /// Number of questions answered so far.
    pub answered: usize,
    /// Number of answers graded correct.
    pub correct: usize,
}

/// Quiz session for one learner working through one lesson.
#[derive(Clone, Debug)]
pub struct QuizSession {
    learner: LearnerId,
    lesson: LessonId,
    questions: Vec<Question>,
    config: Config,
    answered: usize,
    correct: usize,
    status: SessionStatus,
}

impl QuizSession {
    /// Creates a session that activates once the lesson start is confirmed.
    #[must_use]
    pub fn new(
        learner: LearnerId,
        lesson: LessonId,
        questions: Vec<Question>,
        config: Config,
    ) -> Self {
        Self {
            learner,
            lesson,
            questions,
            config,
            answered: 0,
            correct: 0,
            status: SessionStatus::Waiting,
        }
    }

    /// Learner taking the quiz.
    #[must_use]
    pub const fn learner(&self) -> LearnerId {
        self.learner
    }

    /// Lesson the quiz belongs to.
    #[must_use]
    pub const fn lesson(&self) -> LessonId {
        self.lesson
    }

    /// Current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Counts of answered and correct questions.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.answered,
            correct: self.correct,
        }
    }

    /// Question awaiting an answer, if the session is active.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.status != SessionStatus::Active {
            return None;
        }
        self.questions.get(self.answered)
    }

    /// Consumes world events to activate or abort the session.
    ///
    /// The session activates on the matching `Event::LessonStarted` and fails
    /// when the learner's hearts drop to zero while answers are pending.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match *event {
                Event::LessonStarted {
                    learner, lesson, ..
                } if learner == self.learner
                    && lesson == self.lesson
                    && self.status == SessionStatus::Waiting =>
                {
                    self.status = SessionStatus::Active;
                    if self.questions.is_empty() {
                        self.finish(true, out);
                    }
                }
                Event::HeartsChanged { learner, hearts: 0 }
                    if learner == self.learner && self.status == SessionStatus::Active =>
                {
                    self.finish(false, out);
                }
                _ => {}
            }
        }
    }

    /// Grades `answer` against the current question and emits the outcome.
    ///
    /// Emits `Command::RecordAnswer` for every graded answer and
    /// `Command::CompleteLesson` after the final question.
    pub fn answer(&mut self, answer: &Answer, out: &mut Vec<Command>) -> Result<bool, GradeError> {
        let question = self
            .current_question()
            .ok_or(GradeError::SessionInactive)?;
        let correct = grade(question, answer)?;

        self.answered += 1;
        if correct {
            self.correct += 1;
        }
        out.push(Command::RecordAnswer {
            learner: self.learner,
            lesson: self.lesson,
            correct,
        });

        if self.answered == self.questions.len() {
            let passed = self.passes();
            self.finish(passed, out);
        }

        Ok(correct)
    }

    fn passes(&self) -> bool {
        if self.questions.is_empty() {
            return true;
        }
        let ratio = self.correct as f32 / self.questions.len() as f32;
        ratio >= self.config.pass_threshold()
    }

    fn finish(&mut self, passed: bool, out: &mut Vec<Command>) {
        self.status = SessionStatus::Finished { passed };
        out.push(Command::CompleteLesson {
            learner: self.learner,
            lesson: self.lesson,
            passed,
        });
    }
}
