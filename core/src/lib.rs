#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Almanac learning engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Almanac.";

/// Number of units laid out on each row of the learning path.
pub const DEFAULT_GRID_COLUMNS: u32 = 5;

/// Maximum number of hearts a learner can hold.
pub const MAX_HEARTS: u8 = 5;

/// Number of ad rewards a learner may claim per calendar day.
pub const AD_REWARDS_PER_DAY: u8 = 3;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Installs or replaces the definition of a curriculum.
    ConfigureCurriculum {
        /// Curriculum being defined.
        curriculum: CurriculumId,
        /// Units composing the curriculum, in content-store order.
        units: Vec<UnitPlan>,
    },
    /// Removes a curriculum from the catalog.
    RemoveCurriculum {
        /// Curriculum targeted for removal.
        curriculum: CurriculumId,
    },
    /// Registers a learner with a fresh wallet.
    EnrollLearner {
        /// Learner to register.
        learner: LearnerId,
    },
    /// Toggles the learner's subscription flag.
    SetSubscription {
        /// Learner whose subscription changed.
        learner: LearnerId,
        /// Whether the subscription is active.
        active: bool,
    },
    /// Advances the world calendar to the provided day.
    SetCalendarDay {
        /// Day that becomes current.
        day: DayIndex,
    },
    /// Requests that a learner enter a lesson.
    StartLesson {
        /// Learner attempting to enter.
        learner: LearnerId,
        /// Lesson the learner wants to take.
        lesson: LessonId,
    },
    /// Records the outcome of a single answered question.
    RecordAnswer {
        /// Learner who answered.
        learner: LearnerId,
        /// Lesson the answer belongs to.
        lesson: LessonId,
        /// Whether the answer was graded correct.
        correct: bool,
    },
    /// Finishes the learner's active lesson.
    CompleteLesson {
        /// Learner finishing the lesson.
        learner: LearnerId,
        /// Lesson being finished.
        lesson: LessonId,
        /// Whether the learner passed the lesson's test.
        passed: bool,
    },
    /// Marks a unit completed without passing its lessons individually.
    MarkUnitCompleted {
        /// Learner credited with the unit.
        learner: LearnerId,
        /// Curriculum containing the unit.
        curriculum: CurriculumId,
        /// Unit being credited.
        unit: UnitId,
    },
    /// Adds or removes hearts from a learner's wallet.
    AdjustHearts {
        /// Learner whose hearts change.
        learner: LearnerId,
        /// Signed number of hearts to apply.
        delta: i8,
    },
    /// Grants experience points to a learner.
    AwardXp {
        /// Learner receiving the points.
        learner: LearnerId,
        /// Number of points granted.
        amount: u32,
    },
    /// Records learning activity on the current calendar day.
    RecordActivity {
        /// Learner who was active.
        learner: LearnerId,
    },
    /// Claims the heart granted for watching an ad.
    ClaimAdReward {
        /// Learner claiming the reward.
        learner: LearnerId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a curriculum definition was installed.
    CurriculumConfigured {
        /// Curriculum that was defined.
        curriculum: CurriculumId,
        /// Number of units the curriculum now contains.
        units: usize,
    },
    /// Reports that a curriculum command was rejected.
    CurriculumRejected {
        /// Curriculum targeted by the command.
        curriculum: CurriculumId,
        /// Specific reason the command failed.
        reason: ContentError,
    },
    /// Confirms that a curriculum was removed.
    CurriculumRemoved {
        /// Curriculum that was removed.
        curriculum: CurriculumId,
    },
    /// Confirms that a learner was registered.
    LearnerEnrolled {
        /// Learner that was registered.
        learner: LearnerId,
    },
    /// Announces a change to a learner's subscription.
    SubscriptionChanged {
        /// Learner whose subscription changed.
        learner: LearnerId,
        /// Whether the subscription is now active.
        active: bool,
    },
    /// Announces that the calendar moved forward.
    DayChanged {
        /// Day that became current.
        day: DayIndex,
    },
    /// Confirms that a learner entered a lesson.
    LessonStarted {
        /// Learner that entered.
        learner: LearnerId,
        /// Lesson that was entered.
        lesson: LessonId,
        /// Unit containing the lesson.
        unit: UnitId,
    },
    /// Reports that a lesson start request was rejected.
    LessonStartRejected {
        /// Learner that attempted to enter.
        learner: LearnerId,
        /// Lesson that was requested.
        lesson: LessonId,
        /// Specific reason entry was refused.
        reason: LessonAccessError,
    },
    /// Confirms that an answer was recorded against the active lesson.
    AnswerRecorded {
        /// Learner who answered.
        learner: LearnerId,
        /// Lesson the answer belongs to.
        lesson: LessonId,
        /// Whether the answer was correct.
        correct: bool,
    },
    /// Confirms that the learner left a lesson.
    LessonCompleted {
        /// Learner who finished.
        learner: LearnerId,
        /// Lesson that was finished.
        lesson: LessonId,
        /// Whether the learner passed.
        passed: bool,
        /// Calendar day on which the lesson finished.
        day: DayIndex,
    },
    /// Announces that a learner completed a unit.
    UnitCompleted {
        /// Learner credited with the unit.
        learner: LearnerId,
        /// Curriculum containing the unit.
        curriculum: CurriculumId,
        /// Unit that was completed.
        unit: UnitId,
    },
    /// Announces that a learner completed every required unit of a curriculum.
    CurriculumCompleted {
        /// Learner that finished the curriculum.
        learner: LearnerId,
        /// Curriculum that was finished.
        curriculum: CurriculumId,
    },
    /// Reports the learner's new heart count.
    HeartsChanged {
        /// Learner whose hearts changed.
        learner: LearnerId,
        /// Hearts held after the change.
        hearts: u8,
    },
    /// Confirms that experience points were granted.
    XpAwarded {
        /// Learner receiving the points.
        learner: LearnerId,
        /// Points granted by the command.
        amount: u32,
        /// Total points held after the award.
        total: u64,
    },
    /// Reports the learner's new streak length.
    StreakChanged {
        /// Learner whose streak changed.
        learner: LearnerId,
        /// Consecutive active days after the change.
        days: u32,
    },
    /// Confirms that an ad reward was granted.
    AdRewardGranted {
        /// Learner that claimed the reward.
        learner: LearnerId,
        /// Hearts held after the reward.
        hearts: u8,
    },
    /// Reports that an ad reward claim was rejected.
    AdRewardRejected {
        /// Learner that attempted the claim.
        learner: LearnerId,
        /// Specific reason the claim failed.
        reason: RewardError,
    },
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

numeric_id!(
    /// Unique identifier assigned to a unit within its curriculum.
    UnitId
);
numeric_id!(
    /// Unique identifier assigned to a curriculum.
    CurriculumId
);
numeric_id!(
    /// Unique identifier assigned to a lesson.
    LessonId
);
numeric_id!(
    /// Unique identifier assigned to a learner.
    LearnerId
);

/// Calendar day expressed as whole days since an adapter-chosen epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayIndex(u32);

impl DayIndex {
    /// Creates a new day index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the number of days since the epoch.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Reports whether `self` is exactly the day after `previous`.
    #[must_use]
    pub const fn follows(self, previous: DayIndex) -> bool {
        previous.0 < u32::MAX && self.0 == previous.0 + 1
    }
}

/// Location of a single unit on the learning-path grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    row: u32,
    column: u32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Manhattan distance between two grid coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: GridCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Reports whether the two cells share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: GridCoord) -> bool {
        self.manhattan_distance(other) == 1
    }
}

/// Maps linear unit positions onto the rows of the learning-path grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridLayout {
    columns: NonZeroU32,
}

impl GridLayout {
    /// Creates a layout with the provided number of columns per row.
    #[must_use]
    pub const fn new(columns: NonZeroU32) -> Self {
        Self { columns }
    }

    /// Creates a layout from a raw column count, rejecting zero.
    #[must_use]
    pub fn with_columns(columns: u32) -> Option<Self> {
        NonZeroU32::new(columns).map(Self::new)
    }

    /// Number of units placed on each row.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns.get()
    }

    /// Converts a linear position into its grid coordinate.
    #[must_use]
    pub const fn coord_of(&self, position: Position) -> GridCoord {
        let columns = self.columns.get();
        GridCoord::new(position.get() / columns, position.get() % columns)
    }

    /// Number of rows needed to hold the provided highest position.
    ///
    /// Saturates at `u32::MAX` for positions on the last representable row.
    #[must_use]
    pub const fn rows_for(&self, highest: Position) -> u32 {
        self.coord_of(highest).row().saturating_add(1)
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::new(NonZeroU32::MIN.saturating_add(DEFAULT_GRID_COLUMNS - 1))
    }
}

/// Linear placement of a unit within its curriculum's grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(u32);

impl Position {
    /// Creates a new position wrapper.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the underlying linear index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unit as consumed by the progression engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier of the unit, unique within its curriculum.
    pub id: UnitId,
    /// Placement of the unit on the learning-path grid.
    pub position: Position,
    /// Whether the unit is required for curriculum completion.
    pub mandatory: bool,
}

impl Unit {
    /// Creates a new unit descriptor.
    #[must_use]
    pub const fn new(id: UnitId, position: Position, mandatory: bool) -> Self {
        Self {
            id,
            position,
            mandatory,
        }
    }
}

/// Unit definition together with the lessons it contains.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPlan {
    /// Placement data consumed by the progression engine.
    pub unit: Unit,
    /// Lessons contained in the unit, in presentation order.
    pub lessons: Vec<LessonId>,
}

impl UnitPlan {
    /// Creates a unit plan from its descriptor and lessons.
    #[must_use]
    pub fn new(unit: Unit, lessons: Vec<LessonId>) -> Self {
        Self { unit, lessons }
    }
}

/// Progression state a unit displays to a learner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitState {
    /// The learner already passed the unit.
    Completed,
    /// The unit may be entered next.
    Available,
    /// The unit cannot be entered yet.
    Locked,
}

impl UnitState {
    /// Reports whether lessons inside a unit in this state may be started.
    #[must_use]
    pub const fn permits_entry(self) -> bool {
        matches!(self, Self::Completed | Self::Available)
    }
}

/// Hearts, experience and streak data owned by a learner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Hearts currently held.
    pub hearts: u8,
    /// Experience points accumulated.
    pub xp: u64,
    /// Consecutive-day activity streak.
    pub streak: Streak,
    /// Whether the learner holds an active subscription.
    pub subscribed: bool,
}

impl Default for Wallet {
    fn default() -> Self {
        Self {
            hearts: MAX_HEARTS,
            xp: 0,
            streak: Streak::default(),
            subscribed: false,
        }
    }
}

/// Immutable representation of a single learner's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LearnerSnapshot {
    /// Identifier of the learner.
    pub id: LearnerId,
    /// Hearts, experience and streak held by the learner.
    pub wallet: Wallet,
    /// Lesson the learner is currently taking, if any.
    pub active_lesson: Option<LessonId>,
    /// Ad rewards claimed on the current calendar day.
    pub ad_rewards_claimed_today: u8,
}

/// Consecutive days on which a learner recorded activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Streak {
    days: u32,
    last_active: Option<DayIndex>,
}

impl Streak {
    /// Number of consecutive active days.
    #[must_use]
    pub const fn days(&self) -> u32 {
        self.days
    }

    /// Returns the streak after recording activity on `day`.
    ///
    /// Activity on the same day leaves the streak untouched, activity on the
    /// following day extends it, and any gap restarts it at one. Days earlier
    /// than the last recorded activity are ignored.
    #[must_use]
    pub fn record(self, day: DayIndex) -> Self {
        match self.last_active {
            Some(last) if day <= last => self,
            Some(last) if day.follows(last) => Self {
                days: self.days.saturating_add(1),
                last_active: Some(day),
            },
            _ => Self {
                days: 1,
                last_active: Some(day),
            },
        }
    }
}

/// Reasons a curriculum command may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum ContentError {
    /// Two units in the definition share an identifier.
    #[error("unit {0:?} is defined more than once")]
    DuplicateUnit(UnitId),
    /// A lesson is listed twice or already belongs to another curriculum.
    #[error("lesson {0:?} is already assigned")]
    DuplicateLesson(LessonId),
    /// A unit contains no lessons.
    #[error("unit {0:?} contains no lessons")]
    EmptyUnit(UnitId),
    /// The targeted curriculum does not exist.
    #[error("curriculum does not exist")]
    MissingCurriculum,
}

/// Reasons a lesson start request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum LessonAccessError {
    /// The learner is not enrolled.
    #[error("learner is not enrolled")]
    UnknownLearner,
    /// No curriculum contains the lesson.
    #[error("lesson does not exist")]
    UnknownLesson,
    /// The unit containing the lesson is still locked for the learner.
    #[error("unit is locked")]
    UnitLocked,
    /// The learner has no hearts left and no subscription.
    #[error("learner is out of hearts")]
    OutOfHearts,
}

/// Reasons an ad reward claim may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum RewardError {
    /// The learner is not enrolled.
    #[error("learner is not enrolled")]
    UnknownLearner,
    /// The learner already holds the maximum number of hearts.
    #[error("hearts are already full")]
    HeartsFull,
    /// The learner claimed every ad reward available today.
    #[error("daily ad reward limit reached")]
    DailyLimitReached,
}
