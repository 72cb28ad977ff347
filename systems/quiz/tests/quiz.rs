use almanac_core::{Command, Event, LearnerId, LessonId, UnitId};
use almanac_system_quiz::{Answer, Config, GradeError, Question, QuizSession, SessionStatus};

const LEARNER: LearnerId = LearnerId::new(3);
const LESSON: LessonId = LessonId::new(30);

fn arithmetic_quiz() -> Vec<Question> {
    vec![
        Question::MultipleChoice {
            prompt: "1 + 1".to_owned(),
            options: vec!["1".to_owned(), "2".to_owned()],
            correct: 1,
        },
        Question::FillInBlank {
            prompt: "2 + 2".to_owned(),
            accepted: vec!["4".to_owned(), "four".to_owned()],
        },
        Question::Ordering {
            prompt: "Sort".to_owned(),
            items: vec!["b".to_owned(), "a".to_owned()],
            correct_order: vec![1, 0],
        },
    ]
}

fn started() -> Event {
    Event::LessonStarted {
        learner: LEARNER,
        lesson: LESSON,
        unit: UnitId::new(1),
    }
}

fn active_session(config: Config) -> QuizSession {
    let mut session = QuizSession::new(LEARNER, LESSON, arithmetic_quiz(), config);
    let mut commands = Vec::new();
    session.handle(&[started()], &mut commands);
    assert!(commands.is_empty());
    session
}

#[test]
fn answers_are_refused_before_lesson_starts() {
    let mut session = QuizSession::new(LEARNER, LESSON, arithmetic_quiz(), Config::default());
    let mut commands = Vec::new();

    assert_eq!(
        session.answer(&Answer::Choice(1), &mut commands),
        Err(GradeError::SessionInactive)
    );
    assert!(commands.is_empty());
    assert_eq!(session.status(), SessionStatus::Waiting);
}

#[test]
fn start_for_another_learner_is_ignored() {
    let mut session = QuizSession::new(LEARNER, LESSON, arithmetic_quiz(), Config::default());
    let mut commands = Vec::new();
    session.handle(
        &[Event::LessonStarted {
            learner: LearnerId::new(99),
            lesson: LESSON,
            unit: UnitId::new(1),
        }],
        &mut commands,
    );
    assert_eq!(session.status(), SessionStatus::Waiting);
}

#[test]
fn perfect_run_records_answers_and_passes() {
    let mut session = active_session(Config::default());
    let mut commands = Vec::new();

    assert_eq!(session.answer(&Answer::Choice(1), &mut commands), Ok(true));
    assert_eq!(
        session.answer(&Answer::Text(" Four ".to_owned()), &mut commands),
        Ok(true)
    );
    assert_eq!(session.answer(&Answer::Order(vec![1, 0]), &mut commands), Ok(true));

    assert_eq!(
        commands,
        vec![
            Command::RecordAnswer {
                learner: LEARNER,
                lesson: LESSON,
                correct: true,
            },
            Command::RecordAnswer {
                learner: LEARNER,
                lesson: LESSON,
                correct: true,
            },
            Command::RecordAnswer {
                learner: LEARNER,
                lesson: LESSON,
                correct: true,
            },
            Command::CompleteLesson {
                learner: LEARNER,
                lesson: LESSON,
                passed: true,
            },
        ]
    );
    assert_eq!(session.status(), SessionStatus::Finished { passed: true });
    assert!(session.current_question().is_none());
}

#[test]
fn score_below_threshold_fails_lesson() {
    let mut session = active_session(Config::default());
    let mut commands = Vec::new();

    assert_eq!(session.answer(&Answer::Choice(0), &mut commands), Ok(false));
    assert_eq!(
        session.answer(&Answer::Text("4".to_owned()), &mut commands),
        Ok(true)
    );
    assert_eq!(session.answer(&Answer::Order(vec![1, 0]), &mut commands), Ok(true));

    assert_eq!(
        commands.last(),
        Some(&Command::CompleteLesson {
            learner: LEARNER,
            lesson: LESSON,
            passed: false,
        }),
        "two out of three is below the default 80% threshold",
    );
    let progress = session.progress();
    assert_eq!((progress.total, progress.answered, progress.correct), (3, 3, 2));
}

#[test]
fn lenient_threshold_passes_partial_score() {
    let mut session = active_session(Config::new(0.6));
    let mut commands = Vec::new();

    let _ = session.answer(&Answer::Choice(0), &mut commands);
    let _ = session.answer(&Answer::Text("4".to_owned()), &mut commands);
    let _ = session.answer(&Answer::Order(vec![1, 0]), &mut commands);

    assert_eq!(session.status(), SessionStatus::Finished { passed: true });
}

#[test]
fn ungradable_answer_does_not_advance() {
    let mut session = active_session(Config::default());
    let mut commands = Vec::new();

    assert!(matches!(
        session.answer(&Answer::Order(vec![0]), &mut commands),
        Err(GradeError::KindMismatch { .. })
    ));
    assert!(commands.is_empty());
    assert_eq!(session.progress().answered, 0);
    assert!(matches!(
        session.current_question(),
        Some(Question::MultipleChoice { .. })
    ));
}

#[test]
fn running_out_of_hearts_fails_session() {
    let mut session = active_session(Config::default());
    let mut commands = Vec::new();

    let _ = session.answer(&Answer::Choice(0), &mut commands);
    commands.clear();

    session.handle(
        &[Event::HeartsChanged {
            learner: LEARNER,
            hearts: 0,
        }],
        &mut commands,
    );

    assert_eq!(
        commands,
        vec![Command::CompleteLesson {
            learner: LEARNER,
            lesson: LESSON,
            passed: false,
        }]
    );
    assert_eq!(session.status(), SessionStatus::Finished { passed: false });
}

#[test]
fn empty_lesson_completes_on_start() {
    let mut session = QuizSession::new(LEARNER, LESSON, Vec::new(), Config::default());
    let mut commands = Vec::new();
    session.handle(&[started()], &mut commands);

    assert_eq!(
        commands,
        vec![Command::CompleteLesson {
            learner: LEARNER,
            lesson: LESSON,
            passed: true,
        }]
    );
}

#[test]
fn session_reports_its_learner_and_lesson() {
    let session = QuizSession::new(LEARNER, LESSON, arithmetic_quiz(), Config::default());
    assert_eq!(session.learner(), LEARNER);
    assert_eq!(session.lesson(), LESSON);
}
