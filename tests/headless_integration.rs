use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use keystride::catalog::{Catalog, Difficulty, Lesson};
use keystride::config::Config;
use keystride::history::MemoryHistoryStore;
use keystride::persistence::MemoryAchievementStore;
use keystride::runtime::{ChannelEventSource, FixedTicker, InputEvent, KeyInput, ManualClock, Runner};
use keystride::session::SessionStatus;
use keystride::{Tutor, TutorEvent};

fn tutor_with(phrases: &[&str], clock: &ManualClock) -> Tutor {
    let lesson = Lesson {
        title: "Headless".to_string(),
        description: String::new(),
        difficulty: Difficulty::Beginner,
        estimated_time: "1 min".to_string(),
        phrases: phrases.iter().map(|p| p.to_string()).collect(),
        fun_fact: None,
    };
    let config = Config {
        tick_interval_ms: 5,
        ..Config::default()
    };
    Tutor::new(
        config,
        Catalog::from_lessons(vec![lesson]).unwrap(),
        Arc::new(clock.clone()),
        Box::new(MemoryAchievementStore::new()),
        Box::new(MemoryHistoryStore::new()),
    )
    .unwrap()
}

// Verifies that a minimal lesson completes when driven through Runner/ChannelEventSource.
#[test]
fn headless_lesson_flow_completes() {
    let clock = ManualClock::default();
    let mut tutor = tutor_with(&["hi", "yo"], &clock);

    let (tx, es) = ChannelEventSource::channel();
    let runner = Runner::new(es, FixedTicker::from_config(tutor.config()));

    // Producer: keystrokes arrive as terminal key events
    for c in "hiyo".chars() {
        let key = KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
        tx.send(InputEvent::Key(KeyInput::from_key_event(&key).unwrap()))
            .unwrap();
    }

    let mut events = Vec::new();
    for _ in 0..100u32 {
        events.extend(tutor.handle(runner.step()));
        if tutor.session().status() == SessionStatus::LessonComplete {
            break;
        }
    }

    assert_eq!(tutor.session().status(), SessionStatus::LessonComplete);
    let phrase_completions = events
        .iter()
        .filter(|e| matches!(e, TutorEvent::PhraseComplete { .. }))
        .count();
    assert_eq!(phrase_completions, 2);
    assert!(events
        .iter()
        .any(|e| matches!(e, TutorEvent::LessonComplete(summary) if summary.accuracy == 100.0)));
    assert_eq!(tutor.history().len(), 1);
}

#[test]
fn headless_ticks_only_while_active() {
    let clock = ManualClock::default();
    let mut tutor = tutor_with(&["abc"], &clock);

    let (_tx, es) = ChannelEventSource::channel();
    let runner = Runner::new(es, FixedTicker::from_config(tutor.config()));

    // Idle: ticks are ignored
    assert!(tutor.handle(runner.step()).is_empty());

    tutor.handle_key(KeyInput::Char('a'));
    clock.advance(Duration::from_secs(1));
    let events = tutor.handle(runner.step());
    assert!(matches!(events.first(), Some(TutorEvent::MetricsTick(m)) if m.elapsed_seconds == 1.0));

    // Paused: ticks are ignored again
    tutor.handle_key(KeyInput::Escape);
    assert!(tutor.handle(runner.step()).is_empty());

    tutor.handle_key(KeyInput::Escape);
    assert!(!tutor.handle(runner.step()).is_empty());
}
