#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative learning state management for Almanac.

use std::collections::{BTreeMap, BTreeSet};

use almanac_core::{
    Command, ContentError, CurriculumId, DayIndex, Event, GridLayout, LearnerId, LessonAccessError,
    LessonId, RewardError, Unit, UnitId, UnitPlan, Wallet, AD_REWARDS_PER_DAY, MAX_HEARTS,
    WELCOME_BANNER,
};
use almanac_system_progression::Progression;
use tracing::{debug, info, warn};

/// Curriculum definition stored in the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Curriculum {
    id: CurriculumId,
    plans: Vec<UnitPlan>,
}

impl Curriculum {
    /// Identifier of the curriculum.
    #[must_use]
    pub const fn id(&self) -> CurriculumId {
        self.id
    }

    /// Unit plans in content-store order.
    #[must_use]
    pub fn plans(&self) -> &[UnitPlan] {
        &self.plans
    }

    /// Units in content-store order, as consumed by the progression engine.
    #[must_use]
    pub fn units(&self) -> Vec<Unit> {
        self.plans.iter().map(|plan| plan.unit).collect()
    }

    /// Looks up the plan of a unit.
    #[must_use]
    pub fn plan(&self, unit: UnitId) -> Option<&UnitPlan> {
        self.plans.iter().find(|plan| plan.unit.id == unit)
    }

    /// Units that must be completed to finish the curriculum.
    ///
    /// Every unit is required when none is flagged mandatory.
    #[must_use]
    pub fn required_units(&self) -> BTreeSet<UnitId> {
        let mandatory: BTreeSet<UnitId> = self
            .plans
            .iter()
            .filter(|plan| plan.unit.mandatory)
            .map(|plan| plan.unit.id)
            .collect();
        if mandatory.is_empty() {
            self.plans.iter().map(|plan| plan.unit.id).collect()
        } else {
            mandatory
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LessonLocation {
    curriculum: CurriculumId,
    unit: UnitId,
}

#[derive(Clone, Debug, Default)]
struct Learner {
    wallet: Wallet,
    active_lesson: Option<LessonId>,
    passed_lessons: BTreeSet<LessonId>,
    completed: BTreeMap<CurriculumId, BTreeSet<UnitId>>,
    finished_curricula: BTreeSet<CurriculumId>,
    ad_claims: Option<(DayIndex, u8)>,
}

impl Learner {
    fn ad_claims_on(&self, day: DayIndex) -> u8 {
        match self.ad_claims {
            Some((claimed_day, count)) if claimed_day == day => count,
            _ => 0,
        }
    }
}

/// Represents the authoritative Almanac learning state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    progression: Progression,
    calendar_day: DayIndex,
    curricula: BTreeMap<CurriculumId, Curriculum>,
    lessons: BTreeMap<LessonId, LessonLocation>,
    learners: BTreeMap<LearnerId, Learner>,
}

impl World {
    /// Creates a new world using the default five-column learning path.
    #[must_use]
    pub fn new() -> Self {
        Self::with_layout(GridLayout::default())
    }

    /// Creates a new world whose learning paths use `layout`.
    #[must_use]
    pub fn with_layout(layout: GridLayout) -> Self {
        Self {
            banner: WELCOME_BANNER,
            progression: Progression::new(layout),
            calendar_day: DayIndex::default(),
            curricula: BTreeMap::new(),
            lessons: BTreeMap::new(),
            learners: BTreeMap::new(),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureCurriculum { curriculum, units } => {
            configure_curriculum(world, curriculum, units, out_events);
        }
        Command::RemoveCurriculum { curriculum } => {
            if world.curricula.remove(&curriculum).is_none() {
                out_events.push(Event::CurriculumRejected {
                    curriculum,
                    reason: ContentError::MissingCurriculum,
                });
                return;
            }

            world
                .lessons
                .retain(|_, location| location.curriculum != curriculum);
            abandon_missing_lessons(world);
            info!(curriculum = curriculum.get(), "curriculum removed");
            out_events.push(Event::CurriculumRemoved { curriculum });
        }
        Command::EnrollLearner { learner } => {
            if world.learners.contains_key(&learner) {
                debug!(learner = learner.get(), "learner already enrolled");
                return;
            }
            let _ = world.learners.insert(learner, Learner::default());
            out_events.push(Event::LearnerEnrolled { learner });
        }
        Command::SetSubscription { learner, active } => {
            let Some(record) = world.learners.get_mut(&learner) else {
                warn!(learner = learner.get(), "subscription change for unknown learner");
                return;
            };
            if record.wallet.subscribed != active {
                record.wallet.subscribed = active;
                out_events.push(Event::SubscriptionChanged { learner, active });
            }
        }
        Command::SetCalendarDay { day } => {
            if day > world.calendar_day {
                world.calendar_day = day;
                out_events.push(Event::DayChanged { day });
            }
        }
        Command::StartLesson { learner, lesson } => {
            match start_lesson(world, learner, lesson) {
                Ok(unit) => out_events.push(Event::LessonStarted {
                    learner,
                    lesson,
                    unit,
                }),
                Err(reason) => {
                    debug!(
                        learner = learner.get(),
                        lesson = lesson.get(),
                        %reason,
                        "lesson start rejected"
                    );
                    out_events.push(Event::LessonStartRejected {
                        learner,
                        lesson,
                        reason,
                    });
                }
            }
        }
        Command::RecordAnswer {
            learner,
            lesson,
            correct,
        } => {
            let active = world
                .learners
                .get(&learner)
                .and_then(|record| record.active_lesson);
            if active == Some(lesson) {
                out_events.push(Event::AnswerRecorded {
                    learner,
                    lesson,
                    correct,
                });
            } else {
                debug!(
                    learner = learner.get(),
                    lesson = lesson.get(),
                    "answer ignored outside the active lesson"
                );
            }
        }
        Command::CompleteLesson {
            learner,
            lesson,
            passed,
        } => complete_lesson(world, learner, lesson, passed, out_events),
        Command::MarkUnitCompleted {
            learner,
            curriculum,
            unit,
        } => {
            let known_unit = world
                .curricula
                .get(&curriculum)
                .is_some_and(|definition| definition.plan(unit).is_some());
            let Some(record) = world.learners.get_mut(&learner) else {
                warn!(learner = learner.get(), "unit completion for unknown learner");
                return;
            };
            if !known_unit {
                warn!(
                    curriculum = curriculum.get(),
                    unit = unit.get(),
                    "unit completion for unknown unit"
                );
                return;
            }
            record_unit_completion(
                &world.curricula,
                record,
                learner,
                curriculum,
                unit,
                out_events,
            );
        }
        Command::AdjustHearts { learner, delta } => {
            let Some(record) = world.learners.get_mut(&learner) else {
                return;
            };
            if delta < 0 && record.wallet.subscribed {
                return;
            }
            let hearts = (i16::from(record.wallet.hearts) + i16::from(delta))
                .clamp(0, i16::from(MAX_HEARTS));
            let hearts = u8::try_from(hearts).unwrap_or(0);
            if hearts != record.wallet.hearts {
                record.wallet.hearts = hearts;
                out_events.push(Event::HeartsChanged { learner, hearts });
            }
        }
        Command::AwardXp { learner, amount } => {
            let Some(record) = world.learners.get_mut(&learner) else {
                return;
            };
            if amount == 0 {
                return;
            }
            record.wallet.xp = record.wallet.xp.saturating_add(u64::from(amount));
            out_events.push(Event::XpAwarded {
                learner,
                amount,
                total: record.wallet.xp,
            });
        }
        Command::RecordActivity { learner } => {
            let Some(record) = world.learners.get_mut(&learner) else {
                return;
            };
            let streak = record.wallet.streak.record(world.calendar_day);
            let changed = streak.days() != record.wallet.streak.days();
            record.wallet.streak = streak;
            if changed {
                out_events.push(Event::StreakChanged {
                    learner,
                    days: streak.days(),
                });
            }
        }
        Command::ClaimAdReward { learner } => {
            match claim_ad_reward(world, learner) {
                Ok(hearts) => {
                    out_events.push(Event::HeartsChanged { learner, hearts });
                    out_events.push(Event::AdRewardGranted { learner, hearts });
                }
                Err(reason) => out_events.push(Event::AdRewardRejected { learner, reason }),
            }
        }
    }
}

fn configure_curriculum(
    world: &mut World,
    curriculum: CurriculumId,
    units: Vec<UnitPlan>,
    out_events: &mut Vec<Event>,
) {
    if let Err(reason) = validate_plans(world, curriculum, &units) {
        warn!(curriculum = curriculum.get(), %reason, "curriculum rejected");
        out_events.push(Event::CurriculumRejected { curriculum, reason });
        return;
    }

    let mut positions = BTreeSet::new();
    for plan in &units {
        if !positions.insert(plan.unit.position) {
            warn!(
                curriculum = curriculum.get(),
                unit = plan.unit.id.get(),
                position = plan.unit.position.get(),
                "duplicate unit position, first listed unit wins ties"
            );
        }
    }

    world
        .lessons
        .retain(|_, location| location.curriculum != curriculum);
    for plan in &units {
        for lesson in &plan.lessons {
            let _ = world.lessons.insert(
                *lesson,
                LessonLocation {
                    curriculum,
                    unit: plan.unit.id,
                },
            );
        }
    }

    abandon_missing_lessons(world);

    let count = units.len();
    let _ = world.curricula.insert(
        curriculum,
        Curriculum {
            id: curriculum,
            plans: units,
        },
    );
    info!(curriculum = curriculum.get(), units = count, "curriculum configured");
    out_events.push(Event::CurriculumConfigured {
        curriculum,
        units: count,
    });
}

/// Clears active lessons that no longer belong to any curriculum.
fn abandon_missing_lessons(world: &mut World) {
    let lessons = &world.lessons;
    for (id, learner) in &mut world.learners {
        if let Some(active) = learner.active_lesson {
            if !lessons.contains_key(&active) {
                debug!(
                    learner = id.get(),
                    lesson = active.get(),
                    "active lesson abandoned"
                );
                learner.active_lesson = None;
            }
        }
    }
}

fn validate_plans(
    world: &World,
    curriculum: CurriculumId,
    units: &[UnitPlan],
) -> Result<(), ContentError> {
    let mut unit_ids = BTreeSet::new();
    let mut lesson_ids = BTreeSet::new();

    for plan in units {
        if !unit_ids.insert(plan.unit.id) {
            return Err(ContentError::DuplicateUnit(plan.unit.id));
        }
        if plan.lessons.is_empty() {
            return Err(ContentError::EmptyUnit(plan.unit.id));
        }
        for lesson in &plan.lessons {
            let owned_elsewhere = world
                .lessons
                .get(lesson)
                .is_some_and(|location| location.curriculum != curriculum);
            if owned_elsewhere || !lesson_ids.insert(*lesson) {
                return Err(ContentError::DuplicateLesson(*lesson));
            }
        }
    }

    Ok(())
}

fn start_lesson(
    world: &mut World,
    learner: LearnerId,
    lesson: LessonId,
) -> Result<UnitId, LessonAccessError> {
    let record = world
        .learners
        .get_mut(&learner)
        .ok_or(LessonAccessError::UnknownLearner)?;
    let location = world
        .lessons
        .get(&lesson)
        .copied()
        .ok_or(LessonAccessError::UnknownLesson)?;
    let curriculum = world
        .curricula
        .get(&location.curriculum)
        .ok_or(LessonAccessError::UnknownLesson)?;

    let empty = BTreeSet::new();
    let completed = record.completed.get(&location.curriculum).unwrap_or(&empty);
    let state = world
        .progression
        .state_of(&curriculum.units(), completed, location.unit);
    if !state.is_some_and(|state| state.permits_entry()) {
        return Err(LessonAccessError::UnitLocked);
    }

    if record.wallet.hearts == 0 && !record.wallet.subscribed {
        return Err(LessonAccessError::OutOfHearts);
    }

    record.active_lesson = Some(lesson);
    Ok(location.unit)
}

fn complete_lesson(
    world: &mut World,
    learner: LearnerId,
    lesson: LessonId,
    passed: bool,
    out_events: &mut Vec<Event>,
) {
    let Some(record) = world.learners.get_mut(&learner) else {
        return;
    };
    if record.active_lesson != Some(lesson) {
        debug!(
            learner = learner.get(),
            lesson = lesson.get(),
            "completion ignored outside the active lesson"
        );
        return;
    }

    record.active_lesson = None;
    out_events.push(Event::LessonCompleted {
        learner,
        lesson,
        passed,
        day: world.calendar_day,
    });

    if !passed {
        return;
    }
    let _ = record.passed_lessons.insert(lesson);

    let Some(location) = world.lessons.get(&lesson).copied() else {
        return;
    };
    let unit_finished = world
        .curricula
        .get(&location.curriculum)
        .and_then(|curriculum| curriculum.plan(location.unit))
        .is_some_and(|plan| {
            plan.lessons
                .iter()
                .all(|lesson| record.passed_lessons.contains(lesson))
        });

    if unit_finished {
        record_unit_completion(
            &world.curricula,
            record,
            learner,
            location.curriculum,
            location.unit,
            out_events,
        );
    }
}

fn record_unit_completion(
    curricula: &BTreeMap<CurriculumId, Curriculum>,
    record: &mut Learner,
    learner: LearnerId,
    curriculum: CurriculumId,
    unit: UnitId,
    out_events: &mut Vec<Event>,
) {
    let completed = record.completed.entry(curriculum).or_default();
    if !completed.insert(unit) {
        return;
    }
    out_events.push(Event::UnitCompleted {
        learner,
        curriculum,
        unit,
    });

    let finished = curricula
        .get(&curriculum)
        .is_some_and(|definition| definition.required_units().is_subset(completed));
    if finished && record.finished_curricula.insert(curriculum) {
        info!(
            learner = learner.get(),
            curriculum = curriculum.get(),
            "curriculum completed"
        );
        out_events.push(Event::CurriculumCompleted {
            learner,
            curriculum,
        });
    }
}

fn claim_ad_reward(world: &mut World, learner: LearnerId) -> Result<u8, RewardError> {
    let day = world.calendar_day;
    let record = world
        .learners
        .get_mut(&learner)
        .ok_or(RewardError::UnknownLearner)?;

    if record.wallet.hearts >= MAX_HEARTS {
        return Err(RewardError::HeartsFull);
    }
    let claimed = record.ad_claims_on(day);
    if claimed >= AD_REWARDS_PER_DAY {
        return Err(RewardError::DailyLimitReached);
    }

    record.ad_claims = Some((day, claimed + 1));
    record.wallet.hearts += 1;
    Ok(record.wallet.hearts)
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::{BTreeMap, BTreeSet};

    use super::{Curriculum, World};
    use almanac_core::{
        CurriculumId, DayIndex, GridLayout, LearnerId, LearnerSnapshot, LessonId, Unit, UnitId,
        UnitState,
    };

    /// Retrieves the welcome banner that adapters may display to learners.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Layout used to place units on learning paths.
    #[must_use]
    pub fn layout(world: &World) -> GridLayout {
        world.progression.layout()
    }

    /// Current calendar day.
    #[must_use]
    pub fn calendar_day(world: &World) -> DayIndex {
        world.calendar_day
    }

    /// Provides read-only access to a curriculum definition.
    #[must_use]
    pub fn curriculum(world: &World, curriculum: CurriculumId) -> Option<&Curriculum> {
        world.curricula.get(&curriculum)
    }

    /// Enumerates the identifiers of every configured curriculum.
    #[must_use]
    pub fn curricula(world: &World) -> Vec<CurriculumId> {
        world.curricula.keys().copied().collect()
    }

    /// Units of a curriculum in content-store order.
    #[must_use]
    pub fn units(world: &World, curriculum: CurriculumId) -> Vec<Unit> {
        world
            .curricula
            .get(&curriculum)
            .map(Curriculum::units)
            .unwrap_or_default()
    }

    /// Resolves the curriculum and unit that contain a lesson.
    #[must_use]
    pub fn unit_of_lesson(world: &World, lesson: LessonId) -> Option<(CurriculumId, UnitId)> {
        world
            .lessons
            .get(&lesson)
            .map(|location| (location.curriculum, location.unit))
    }

    /// Captures a read-only snapshot of a learner.
    #[must_use]
    pub fn learner(world: &World, learner: LearnerId) -> Option<LearnerSnapshot> {
        world.learners.get(&learner).map(|record| LearnerSnapshot {
            id: learner,
            wallet: record.wallet,
            active_lesson: record.active_lesson,
            ad_rewards_claimed_today: record.ad_claims_on(world.calendar_day),
        })
    }

    /// Reports whether the learner passed a lesson.
    #[must_use]
    pub fn lesson_passed(world: &World, learner: LearnerId, lesson: LessonId) -> bool {
        world
            .learners
            .get(&learner)
            .is_some_and(|record| record.passed_lessons.contains(&lesson))
    }

    /// Units the learner completed within a curriculum.
    #[must_use]
    pub fn completed_units(
        world: &World,
        learner: LearnerId,
        curriculum: CurriculumId,
    ) -> BTreeSet<UnitId> {
        world
            .learners
            .get(&learner)
            .and_then(|record| record.completed.get(&curriculum))
            .cloned()
            .unwrap_or_default()
    }

    /// Computes the progression state of every unit for a learner.
    #[must_use]
    pub fn unit_states(
        world: &World,
        learner: LearnerId,
        curriculum: CurriculumId,
    ) -> BTreeMap<UnitId, UnitState> {
        let completed = completed_units(world, learner, curriculum);
        world
            .progression
            .compute_states(&units(world, curriculum), &completed)
    }
}
