//! Drives the world and systems through a curriculum with a scripted learner.

use almanac_core::{Command, CurriculumId, DayIndex, Event, LearnerId, LessonId};
use almanac_system_quiz::{Answer, Config, Question, QuizSession, SessionStatus};
use almanac_system_rewards::Rewards;
use almanac_world::{self as world, query, World};
use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use crate::curriculum::CurriculumFile;

/// Outcome of a scripted walk through a curriculum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WalkSummary {
    pub(crate) lessons: u32,
    pub(crate) finished: bool,
}

/// Enrols `learner` and answers every question correctly until no lesson remains.
pub(crate) fn run(
    world: &mut World,
    curriculum: &CurriculumFile,
    learner: LearnerId,
) -> Result<WalkSummary> {
    let rewards = Rewards::default();
    let id = curriculum.id;

    let events = pump(
        world,
        &rewards,
        None,
        vec![
            Command::ConfigureCurriculum {
                curriculum: id,
                units: curriculum.plans(),
            },
            Command::EnrollLearner { learner },
        ],
    );
    if let Some(Event::CurriculumRejected { reason, .. }) = events
        .iter()
        .find(|event| matches!(event, Event::CurriculumRejected { .. }))
    {
        bail!("curriculum rejected: {reason}");
    }

    let mut summary = WalkSummary {
        lessons: 0,
        finished: false,
    };
    let mut day = query::calendar_day(world).get();

    while let Some(lesson) = next_lesson(world, learner, id) {
        let mut session =
            QuizSession::new(learner, lesson, curriculum.questions(lesson), Config::default());
        let events = pump(
            world,
            &rewards,
            Some(&mut session),
            vec![
                Command::SetCalendarDay {
                    day: DayIndex::new(day),
                },
                Command::StartLesson { learner, lesson },
            ],
        );
        summary.finished |= finished(&events);

        if session.status() == SessionStatus::Waiting {
            bail!("lesson {} could not be started", lesson.get());
        }

        while let Some(answer) = session.current_question().map(scripted_answer) {
            let mut commands = Vec::new();
            let _ = session.answer(&answer, &mut commands)?;
            let events = pump(world, &rewards, Some(&mut session), commands);
            summary.finished |= finished(&events);
        }

        if session.status() != (SessionStatus::Finished { passed: true }) {
            bail!("lesson {} was not passed", lesson.get());
        }
        info!(
            learner = session.learner().get(),
            lesson = session.lesson().get(),
            "lesson passed"
        );
        summary.lessons += 1;
        day += 1;
    }

    if !summary.finished {
        warn!(
            curriculum = id.get(),
            "no further lessons are reachable before curriculum completion"
        );
    }
    Ok(summary)
}

/// First unpassed lesson inside a unit the learner may enter.
fn next_lesson(world: &World, learner: LearnerId, curriculum: CurriculumId) -> Option<LessonId> {
    let states = query::unit_states(world, learner, curriculum);
    let definition = query::curriculum(world, curriculum)?;
    definition
        .plans()
        .iter()
        .filter(|plan| {
            states
                .get(&plan.unit.id)
                .is_some_and(|state| state.permits_entry())
        })
        .flat_map(|plan| plan.lessons.iter().copied())
        .find(|lesson| !query::lesson_passed(world, learner, *lesson))
}

fn scripted_answer(question: &Question) -> Answer {
    question
        .expected_answer()
        .unwrap_or_else(|| Answer::Text(String::new()))
}

fn finished(events: &[Event]) -> bool {
    events
        .iter()
        .any(|event| matches!(event, Event::CurriculumCompleted { .. }))
}

/// Applies commands and feeds the resulting events to the systems until quiescent.
fn pump(
    world: &mut World,
    rewards: &Rewards,
    mut session: Option<&mut QuizSession>,
    mut commands: Vec<Command>,
) -> Vec<Event> {
    let mut log = Vec::new();
    while !commands.is_empty() {
        let mut events = Vec::new();
        for command in commands.drain(..) {
            world::apply(world, command, &mut events);
        }
        for event in &events {
            match event {
                Event::AnswerRecorded { .. } | Event::HeartsChanged { .. } => {
                    debug!(?event, "world event");
                }
                _ => info!(?event, "world event"),
            }
        }

        rewards.handle(&events, &mut commands);
        if let Some(session) = session.as_deref_mut() {
            session.handle(&events, &mut commands);
        }
        log.extend(events);
    }
    log
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRICULUM: &str = r#"
[[units]]
id = 1
position = 0
mandatory = true

[[units.lessons]]
id = 10

[[units.lessons.questions]]
kind = "fill_in_blank"
prompt = "Capital of France"
accepted = ["Paris"]

[[units]]
id = 2
position = 1
mandatory = true

[[units.lessons]]
id = 20

[[units.lessons.questions]]
kind = "ordering"
prompt = "Count up"
items = ["two", "one"]
correct_order = [1, 0]

[[units.lessons]]
id = 21
"#;

    #[test]
    fn scripted_learner_finishes_connected_curriculum() {
        let file = CurriculumFile::parse(CURRICULUM).expect("curriculum parses");
        let mut world = World::new();
        let learner = LearnerId::new(1);

        let summary = run(&mut world, &file, learner).expect("walk succeeds");

        assert_eq!(
            summary,
            WalkSummary {
                lessons: 3,
                finished: true,
            }
        );
        let snapshot = query::learner(&world, learner).expect("learner enrolled");
        assert!(snapshot.wallet.xp > 0);
        assert_eq!(snapshot.wallet.streak.days(), 3);
    }

    #[test]
    fn disconnected_units_stop_the_walk() {
        let file = CurriculumFile::parse(
            r#"
[[units]]
id = 1
position = 0
mandatory = true
lessons = [{ id = 10 }]

[[units]]
id = 2
position = 9
mandatory = true
lessons = [{ id = 20 }]
"#,
        )
        .expect("curriculum parses");
        let mut world = World::new();

        let summary = run(&mut world, &file, LearnerId::new(1)).expect("walk succeeds");

        assert_eq!(
            summary,
            WalkSummary {
                lessons: 1,
                finished: false,
            }
        );
    }

    #[test]
    fn rejected_curriculum_fails_the_walk() {
        let file = CurriculumFile::parse(
            r#"
[[units]]
id = 1
position = 0
"#,
        )
        .expect("curriculum parses");
        let mut world = World::new();

        assert!(run(&mut world, &file, LearnerId::new(1)).is_err());
    }
}
