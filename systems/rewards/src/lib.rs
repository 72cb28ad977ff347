#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure rewards system that turns learning events into wallet commands.

use almanac_core::{Command, Event, LearnerId};

const XP_PER_CORRECT_ANSWER: u32 = 10;
const LESSON_COMPLETION_BONUS: u32 = 20;
const UNIT_COMPLETION_BONUS: u32 = 50;
const HEART_PENALTY: i8 = 1;

/// Configuration parameters required to construct the rewards system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    xp_per_correct_answer: u32,
    lesson_completion_bonus: u32,
    unit_completion_bonus: u32,
    heart_penalty: i8,
}

impl Config {
    /// Creates a configuration with explicit reward amounts.
    #[must_use]
    pub const fn new(
        xp_per_correct_answer: u32,
        lesson_completion_bonus: u32,
        unit_completion_bonus: u32,
        heart_penalty: i8,
    ) -> Self {
        Self {
            xp_per_correct_answer,
            lesson_completion_bonus,
            unit_completion_bonus,
            heart_penalty,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            XP_PER_CORRECT_ANSWER,
            LESSON_COMPLETION_BONUS,
            UNIT_COMPLETION_BONUS,
            HEART_PENALTY,
        )
    }
}

/// Pure system that awards experience, charges hearts, and records activity.
#[derive(Debug, Default)]
pub struct Rewards {
    config: Config,
}

impl Rewards {
    /// Creates a new rewards system using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Consumes world events to emit wallet commands.
    pub fn handle(&self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match *event {
                Event::AnswerRecorded {
                    learner,
                    correct: true,
                    ..
                } => award(learner, self.config.xp_per_correct_answer, out),
                Event::AnswerRecorded {
                    learner,
                    correct: false,
                    ..
                } => {
                    if self.config.heart_penalty > 0 {
                        out.push(Command::AdjustHearts {
                            learner,
                            delta: -self.config.heart_penalty,
                        });
                    }
                }
                Event::LessonCompleted {
                    learner,
                    passed: true,
                    ..
                } => {
                    award(learner, self.config.lesson_completion_bonus, out);
                    out.push(Command::RecordActivity { learner });
                }
                Event::UnitCompleted { learner, .. } => {
                    award(learner, self.config.unit_completion_bonus, out);
                }
                _ => {}
            }
        }
    }
}

fn award(learner: LearnerId, amount: u32, out: &mut Vec<Command>) {
    if amount > 0 {
        out.push(Command::AwardXp { learner, amount });
    }
}
