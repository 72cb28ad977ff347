use almanac_core::{
    Command, ContentError, CurriculumId, DayIndex, Event, LearnerId, LessonAccessError, LessonId,
    Position, RewardError, Unit, UnitId, UnitPlan, UnitState, MAX_HEARTS,
};
use almanac_world::{self as world, query, World};

const CURRICULUM: CurriculumId = CurriculumId::new(1);
const LEARNER: LearnerId = LearnerId::new(7);

fn plan(id: u32, position: u32, mandatory: bool, lessons: &[u32]) -> UnitPlan {
    UnitPlan::new(
        Unit::new(UnitId::new(id), Position::new(position), mandatory),
        lessons.iter().copied().map(LessonId::new).collect(),
    )
}

/// Three units on one row; the entry point is unit 3 at position 2.
fn seeded_world() -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureCurriculum {
            curriculum: CURRICULUM,
            units: vec![
                plan(1, 0, true, &[10]),
                plan(2, 1, false, &[20]),
                plan(3, 2, true, &[30, 31]),
            ],
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::EnrollLearner { learner: LEARNER },
        &mut events,
    );
    assert_eq!(
        events,
        vec![
            Event::CurriculumConfigured {
                curriculum: CURRICULUM,
                units: 3,
            },
            Event::LearnerEnrolled { learner: LEARNER },
        ]
    );
    world
}

fn run(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn pass_lesson(world: &mut World, lesson: u32) -> Vec<Event> {
    let lesson = LessonId::new(lesson);
    run(
        world,
        vec![
            Command::StartLesson {
                learner: LEARNER,
                lesson,
            },
            Command::CompleteLesson {
                learner: LEARNER,
                lesson,
                passed: true,
            },
        ],
    )
}

#[test]
fn enrolled_learner_starts_with_full_wallet() {
    let world = seeded_world();
    let snapshot = query::learner(&world, LEARNER).expect("learner enrolled");
    assert_eq!(snapshot.wallet.hearts, MAX_HEARTS);
    assert_eq!(snapshot.wallet.xp, 0);
    assert_eq!(snapshot.wallet.streak.days(), 0);
    assert!(snapshot.active_lesson.is_none());
}

#[test]
fn enrolling_twice_is_silent() {
    let mut world = seeded_world();
    let events = run(&mut world, vec![Command::EnrollLearner { learner: LEARNER }]);
    assert!(events.is_empty());
}

#[test]
fn only_entry_point_is_open_for_new_learner() {
    let world = seeded_world();
    let states = query::unit_states(&world, LEARNER, CURRICULUM);
    assert_eq!(states[&UnitId::new(3)], UnitState::Available);
    assert_eq!(states[&UnitId::new(1)], UnitState::Locked);
    assert_eq!(states[&UnitId::new(2)], UnitState::Locked);
}

#[test]
fn locked_unit_rejects_lesson_start() {
    let mut world = seeded_world();
    let events = run(
        &mut world,
        vec![Command::StartLesson {
            learner: LEARNER,
            lesson: LessonId::new(10),
        }],
    );
    assert_eq!(
        events,
        vec![Event::LessonStartRejected {
            learner: LEARNER,
            lesson: LessonId::new(10),
            reason: LessonAccessError::UnitLocked,
        }]
    );
}

#[test]
fn unknown_learner_and_lesson_are_rejected() {
    let mut world = seeded_world();
    let events = run(
        &mut world,
        vec![
            Command::StartLesson {
                learner: LearnerId::new(404),
                lesson: LessonId::new(30),
            },
            Command::StartLesson {
                learner: LEARNER,
                lesson: LessonId::new(999),
            },
        ],
    );
    let reasons: Vec<LessonAccessError> = events
        .iter()
        .filter_map(|event| match event {
            Event::LessonStartRejected { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect();
    assert_eq!(
        reasons,
        vec![
            LessonAccessError::UnknownLearner,
            LessonAccessError::UnknownLesson
        ]
    );
}

#[test]
fn unit_completes_after_every_lesson_passes() {
    let mut world = seeded_world();

    let first = pass_lesson(&mut world, 30);
    assert_eq!(
        first,
        vec![
            Event::LessonStarted {
                learner: LEARNER,
                lesson: LessonId::new(30),
                unit: UnitId::new(3),
            },
            Event::LessonCompleted {
                learner: LEARNER,
                lesson: LessonId::new(30),
                passed: true,
                day: DayIndex::new(0),
            },
        ]
    );
    assert!(query::lesson_passed(&world, LEARNER, LessonId::new(30)));
    assert!(query::completed_units(&world, LEARNER, CURRICULUM).is_empty());

    let second = pass_lesson(&mut world, 31);
    assert!(second.contains(&Event::UnitCompleted {
        learner: LEARNER,
        curriculum: CURRICULUM,
        unit: UnitId::new(3),
    }));

    let states = query::unit_states(&world, LEARNER, CURRICULUM);
    assert_eq!(states[&UnitId::new(3)], UnitState::Completed);
    assert_eq!(states[&UnitId::new(2)], UnitState::Available);
    assert_eq!(states[&UnitId::new(1)], UnitState::Locked);
}

#[test]
fn failed_lesson_does_not_count() {
    let mut world = seeded_world();
    let events = run(
        &mut world,
        vec![
            Command::StartLesson {
                learner: LEARNER,
                lesson: LessonId::new(30),
            },
            Command::CompleteLesson {
                learner: LEARNER,
                lesson: LessonId::new(30),
                passed: false,
            },
        ],
    );
    assert_eq!(events.len(), 2);
    assert!(!query::lesson_passed(&world, LEARNER, LessonId::new(30)));
    assert!(query::learner(&world, LEARNER)
        .expect("learner enrolled")
        .active_lesson
        .is_none());
}

#[test]
fn answers_outside_active_lesson_are_ignored() {
    let mut world = seeded_world();
    let events = run(
        &mut world,
        vec![
            Command::RecordAnswer {
                learner: LEARNER,
                lesson: LessonId::new(30),
                correct: true,
            },
            Command::CompleteLesson {
                learner: LEARNER,
                lesson: LessonId::new(30),
                passed: true,
            },
        ],
    );
    assert!(events.is_empty());
}

#[test]
fn finishing_mandatory_units_completes_curriculum_once() {
    let mut world = seeded_world();
    let _ = pass_lesson(&mut world, 30);
    let _ = pass_lesson(&mut world, 31);
    let _ = pass_lesson(&mut world, 20);

    let events = pass_lesson(&mut world, 10);
    assert_eq!(
        &events[2..],
        &[
            Event::UnitCompleted {
                learner: LEARNER,
                curriculum: CURRICULUM,
                unit: UnitId::new(1),
            },
            Event::CurriculumCompleted {
                learner: LEARNER,
                curriculum: CURRICULUM,
            },
        ]
    );

    let replay = pass_lesson(&mut world, 10);
    assert!(!replay
        .iter()
        .any(|event| matches!(event, Event::CurriculumCompleted { .. })));
}

#[test]
fn marking_unit_completed_unlocks_neighbours() {
    let mut world = seeded_world();
    let events = run(
        &mut world,
        vec![Command::MarkUnitCompleted {
            learner: LEARNER,
            curriculum: CURRICULUM,
            unit: UnitId::new(1),
        }],
    );
    assert_eq!(
        events,
        vec![Event::UnitCompleted {
            learner: LEARNER,
            curriculum: CURRICULUM,
            unit: UnitId::new(1),
        }]
    );
    let states = query::unit_states(&world, LEARNER, CURRICULUM);
    assert_eq!(states[&UnitId::new(2)], UnitState::Available);
    assert_eq!(states[&UnitId::new(3)], UnitState::Locked);
}

#[test]
fn hearts_clamp_and_block_lessons_when_empty() {
    let mut world = seeded_world();
    let events = run(
        &mut world,
        vec![
            Command::AdjustHearts {
                learner: LEARNER,
                delta: -3,
            },
            Command::AdjustHearts {
                learner: LEARNER,
                delta: -9,
            },
            Command::AdjustHearts {
                learner: LEARNER,
                delta: -1,
            },
            Command::StartLesson {
                learner: LEARNER,
                lesson: LessonId::new(30),
            },
        ],
    );
    assert_eq!(
        events,
        vec![
            Event::HeartsChanged {
                learner: LEARNER,
                hearts: 2,
            },
            Event::HeartsChanged {
                learner: LEARNER,
                hearts: 0,
            },
            Event::LessonStartRejected {
                learner: LEARNER,
                lesson: LessonId::new(30),
                reason: LessonAccessError::OutOfHearts,
            },
        ]
    );
}

#[test]
fn subscribers_keep_hearts_and_enter_when_empty() {
    let mut world = seeded_world();
    let events = run(
        &mut world,
        vec![
            Command::AdjustHearts {
                learner: LEARNER,
                delta: -5,
            },
            Command::SetSubscription {
                learner: LEARNER,
                active: true,
            },
            Command::AdjustHearts {
                learner: LEARNER,
                delta: -1,
            },
            Command::StartLesson {
                learner: LEARNER,
                lesson: LessonId::new(30),
            },
        ],
    );
    assert_eq!(
        events,
        vec![
            Event::HeartsChanged {
                learner: LEARNER,
                hearts: 0,
            },
            Event::SubscriptionChanged {
                learner: LEARNER,
                active: true,
            },
            Event::LessonStarted {
                learner: LEARNER,
                lesson: LessonId::new(30),
                unit: UnitId::new(3),
            },
        ]
    );
}

#[test]
fn ad_rewards_respect_full_hearts_and_daily_limit() {
    let mut world = seeded_world();
    let full = run(&mut world, vec![Command::ClaimAdReward { learner: LEARNER }]);
    assert_eq!(
        full,
        vec![Event::AdRewardRejected {
            learner: LEARNER,
            reason: RewardError::HeartsFull,
        }]
    );

    let mut claims = vec![Command::AdjustHearts {
        learner: LEARNER,
        delta: -5,
    }];
    claims.extend((0..4).map(|_| Command::ClaimAdReward { learner: LEARNER }));
    let events = run(&mut world, claims);

    let granted: Vec<u8> = events
        .iter()
        .filter_map(|event| match event {
            Event::AdRewardGranted { hearts, .. } => Some(*hearts),
            _ => None,
        })
        .collect();
    assert_eq!(granted, vec![1, 2, 3]);
    assert_eq!(
        events.last(),
        Some(&Event::AdRewardRejected {
            learner: LEARNER,
            reason: RewardError::DailyLimitReached,
        })
    );

    let next_day = run(
        &mut world,
        vec![
            Command::SetCalendarDay {
                day: DayIndex::new(1),
            },
            Command::ClaimAdReward { learner: LEARNER },
        ],
    );
    assert!(next_day.contains(&Event::AdRewardGranted {
        learner: LEARNER,
        hearts: 4,
    }));
}

#[test]
fn streak_follows_calendar() {
    let mut world = seeded_world();
    let activity = || Command::RecordActivity { learner: LEARNER };
    let events = run(
        &mut world,
        vec![
            activity(),
            activity(),
            Command::SetCalendarDay {
                day: DayIndex::new(1),
            },
            activity(),
            Command::SetCalendarDay {
                day: DayIndex::new(5),
            },
            activity(),
        ],
    );
    let streaks: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Event::StreakChanged { days, .. } => Some(*days),
            _ => None,
        })
        .collect();
    assert_eq!(streaks, vec![1, 2, 1]);
}

#[test]
fn calendar_never_moves_backwards() {
    let mut world = seeded_world();
    let events = run(
        &mut world,
        vec![
            Command::SetCalendarDay {
                day: DayIndex::new(3),
            },
            Command::SetCalendarDay {
                day: DayIndex::new(2),
            },
        ],
    );
    assert_eq!(events.len(), 1);
    assert_eq!(query::calendar_day(&world), DayIndex::new(3));
}

#[test]
fn invalid_curricula_are_rejected() {
    let mut world = seeded_world();
    let events = run(
        &mut world,
        vec![
            Command::ConfigureCurriculum {
                curriculum: CurriculumId::new(2),
                units: vec![plan(1, 0, true, &[100]), plan(1, 1, true, &[101])],
            },
            Command::ConfigureCurriculum {
                curriculum: CurriculumId::new(2),
                units: vec![plan(1, 0, true, &[])],
            },
            Command::ConfigureCurriculum {
                curriculum: CurriculumId::new(2),
                units: vec![plan(1, 0, true, &[10])],
            },
            Command::RemoveCurriculum {
                curriculum: CurriculumId::new(2),
            },
        ],
    );
    let reasons: Vec<ContentError> = events
        .iter()
        .filter_map(|event| match event {
            Event::CurriculumRejected { reason, .. } => Some(*reason),
            _ => None,
        })
        .collect();
    assert_eq!(
        reasons,
        vec![
            ContentError::DuplicateUnit(UnitId::new(1)),
            ContentError::EmptyUnit(UnitId::new(1)),
            ContentError::DuplicateLesson(LessonId::new(10)),
            ContentError::MissingCurriculum,
        ]
    );
    assert_eq!(query::curricula(&world), vec![CURRICULUM]);
}

#[test]
fn duplicate_positions_are_accepted() {
    let mut world = World::new();
    let events = run(
        &mut world,
        vec![Command::ConfigureCurriculum {
            curriculum: CURRICULUM,
            units: vec![plan(1, 4, true, &[10]), plan(2, 4, true, &[20])],
        }],
    );
    assert_eq!(
        events,
        vec![Event::CurriculumConfigured {
            curriculum: CURRICULUM,
            units: 2,
        }]
    );
}

#[test]
fn removing_curriculum_clears_active_lesson() {
    let mut world = seeded_world();
    let events = run(
        &mut world,
        vec![
            Command::StartLesson {
                learner: LEARNER,
                lesson: LessonId::new(30),
            },
            Command::RemoveCurriculum {
                curriculum: CURRICULUM,
            },
        ],
    );
    assert_eq!(
        events.last(),
        Some(&Event::CurriculumRemoved {
            curriculum: CURRICULUM,
        })
    );
    assert!(query::units(&world, CURRICULUM).is_empty());
    assert!(query::unit_of_lesson(&world, LessonId::new(30)).is_none());
    assert!(query::learner(&world, LEARNER)
        .expect("learner enrolled")
        .active_lesson
        .is_none());
}

#[test]
fn reconfiguring_curriculum_abandons_dropped_active_lesson() {
    let mut world = seeded_world();
    let _ = run(
        &mut world,
        vec![Command::StartLesson {
            learner: LEARNER,
            lesson: LessonId::new(30),
        }],
    );

    let events = run(
        &mut world,
        vec![
            Command::ConfigureCurriculum {
                curriculum: CURRICULUM,
                units: vec![plan(3, 2, true, &[32])],
            },
            Command::RecordAnswer {
                learner: LEARNER,
                lesson: LessonId::new(30),
                correct: true,
            },
            Command::CompleteLesson {
                learner: LEARNER,
                lesson: LessonId::new(30),
                passed: true,
            },
        ],
    );

    assert_eq!(
        events,
        vec![Event::CurriculumConfigured {
            curriculum: CURRICULUM,
            units: 1,
        }],
        "answers for a dropped lesson must not be recorded"
    );
    assert!(query::unit_of_lesson(&world, LessonId::new(30)).is_none());
    assert!(query::learner(&world, LEARNER)
        .expect("learner enrolled")
        .active_lesson
        .is_none());
}

#[test]
fn reconfiguring_curriculum_keeps_surviving_active_lesson() {
    let mut world = seeded_world();
    let _ = run(
        &mut world,
        vec![Command::StartLesson {
            learner: LEARNER,
            lesson: LessonId::new(30),
        }],
    );
    let _ = run(
        &mut world,
        vec![Command::ConfigureCurriculum {
            curriculum: CURRICULUM,
            units: vec![plan(3, 2, true, &[30])],
        }],
    );

    assert_eq!(
        query::learner(&world, LEARNER)
            .expect("learner enrolled")
            .active_lesson,
        Some(LessonId::new(30))
    );
}
