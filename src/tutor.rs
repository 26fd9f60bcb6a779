use crate::achievements::{evaluate, Achievement, Observation};
use crate::catalog::{Catalog, LessonStatus};
use crate::config::Config;
use crate::error::Result;
use crate::history::{
    day_streak, HistoryStore, HistorySummary, MemoryHistoryStore, SessionRecord,
    SqliteHistoryStore,
};
use crate::metrics::Metrics;
use crate::persistence::{AchievementStore, FileAchievementStore, MemoryAchievementStore};
use crate::runtime::{Clock, InputEvent, KeyInput, SystemClock};
use crate::session::{LessonSummary, Session, SessionStatus};
use chrono::{DateTime, Local};
use log::{debug, info, warn};
use std::sync::Arc;

/// Notifications for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum TutorEvent {
    MetricsTick(Metrics),
    PhraseComplete { phrase_index: usize, metrics: Metrics },
    LessonComplete(LessonSummary),
    AchievementUnlocked(Achievement),
}

/// Owns the active session plus the state shared across sessions
/// (achievements and history), and turns input into [`TutorEvent`]s.
///
/// Ticks only ever reach the session currently owned here, so replacing the
/// session is enough to retire any timer driving the old one.
#[derive(Debug)]
pub struct Tutor {
    config: Config,
    catalog: Catalog,
    clock: Arc<dyn Clock>,
    session: Session,
    lesson_id: Option<usize>,
    achievements: Vec<Achievement>,
    achievement_store: Box<dyn AchievementStore>,
    history: Vec<SessionRecord>,
    history_store: Box<dyn HistoryStore>,
}

impl Tutor {
    pub fn new(
        config: Config,
        catalog: Catalog,
        clock: Arc<dyn Clock>,
        achievement_store: Box<dyn AchievementStore>,
        history_store: Box<dyn HistoryStore>,
    ) -> Result<Self> {
        let lesson_id = if config.last_lesson < catalog.len() {
            config.last_lesson
        } else {
            0
        };
        let session = Session::new(
            catalog.lesson(lesson_id).clone(),
            config.start_policy,
            clock.clone(),
        )?;

        let achievements = achievement_store.load();
        let history = history_store.load().unwrap_or_else(|e| {
            warn!("could not load typing history: {e}");
            Vec::new()
        });

        Ok(Self {
            config,
            catalog,
            clock,
            session,
            lesson_id: Some(lesson_id),
            achievements,
            achievement_store,
            history,
            history_store,
        })
    }

    /// Tutor over the embedded catalog and the real clock. With `persist` on,
    /// achievements and history go to the platform data directories; if the
    /// history database cannot be opened the tutor still works from memory.
    pub fn open(config: Config) -> Result<Self> {
        let catalog = Catalog::embedded()?;
        let (achievement_store, history_store): (Box<dyn AchievementStore>, Box<dyn HistoryStore>) =
            if config.persist {
                let history: Box<dyn HistoryStore> = match SqliteHistoryStore::new() {
                    Ok(store) => Box::new(store),
                    Err(e) => {
                        warn!("history database unavailable, keeping history in memory: {e}");
                        Box::new(MemoryHistoryStore::new())
                    }
                };
                (Box::new(FileAchievementStore::new()), history)
            } else {
                (
                    Box::new(MemoryAchievementStore::new()),
                    Box::new(MemoryHistoryStore::new()),
                )
            };

        Self::new(
            config,
            catalog,
            Arc::new(SystemClock),
            achievement_store,
            history_store,
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Catalog index of the active lesson; `None` for free practice text.
    pub fn lesson_id(&self) -> Option<usize> {
        self.lesson_id
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn history(&self) -> &[SessionRecord] {
        &self.history
    }

    pub fn history_summary(&self) -> HistorySummary {
        HistorySummary::from_records(&self.history, self.today())
    }

    pub fn lesson_status(&self, index: usize) -> LessonStatus {
        self.catalog.status(index, self.history.len())
    }

    /// Replace the session with lesson `id` (the first lesson when out of range).
    pub fn select_lesson(&mut self, id: usize) -> Result<()> {
        let id = if id < self.catalog.len() { id } else { 0 };
        self.session = Session::new(
            self.catalog.lesson(id).clone(),
            self.config.start_policy,
            self.clock.clone(),
        )?;
        self.lesson_id = Some(id);
        self.config.last_lesson = id;
        debug!("selected lesson {id}");
        Ok(())
    }

    /// Replace the session with free-standing practice text.
    pub fn practice_text(&mut self, text: impl Into<String>) -> Result<()> {
        self.session = Session::for_text(text, self.config.start_policy, self.clock.clone())?;
        self.lesson_id = None;
        Ok(())
    }

    /// Whether periodic ticks do anything right now. Paused, idle and finished
    /// sessions are never recomputed.
    pub fn wants_ticks(&self) -> bool {
        self.session.status() == SessionStatus::Active
    }

    pub fn handle(&mut self, event: InputEvent) -> Vec<TutorEvent> {
        match event {
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::Tick => self.on_tick(),
        }
    }

    pub fn handle_key(&mut self, key: KeyInput) -> Vec<TutorEvent> {
        let mut events = Vec::new();

        match key {
            KeyInput::Char(c) => self.type_char(c, &mut events),
            KeyInput::Backspace => {
                if self.session.backspace() {
                    events.push(TutorEvent::MetricsTick(self.session.metrics()));
                }
            }
            KeyInput::Enter => match self.session.status() {
                SessionStatus::Idle | SessionStatus::Active
                    if self.session.expected_char() == Some('\n') =>
                {
                    self.type_char('\n', &mut events)
                }
                SessionStatus::Idle | SessionStatus::Paused => {
                    self.session.start();
                }
                SessionStatus::PhraseComplete => self.advance(&mut events),
                _ => {}
            },
            KeyInput::Escape => match self.session.status() {
                SessionStatus::Active => {
                    self.session.pause();
                }
                SessionStatus::Paused => {
                    self.session.start();
                }
                _ => {}
            },
        }

        events
    }

    /// Periodic recomputation of live metrics and achievements.
    pub fn on_tick(&mut self) -> Vec<TutorEvent> {
        if !self.wants_ticks() {
            return Vec::new();
        }

        let metrics = self.session.metrics();
        let mut events = vec![TutorEvent::MetricsTick(metrics)];
        let obs = self.observation(metrics, false);
        self.evaluate_achievements(&obs, &mut events);
        events
    }

    pub fn pause(&mut self) -> bool {
        self.session.pause()
    }

    pub fn resume(&mut self) -> bool {
        self.session.start()
    }

    /// Restart the current phrase.
    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Restart the lesson from its first phrase.
    pub fn reset_lesson(&mut self) {
        self.session.reset_lesson();
    }

    /// Advance past a completed phrase, e.g. when auto-advance is off.
    pub fn advance_phrase(&mut self) -> Vec<TutorEvent> {
        let mut events = Vec::new();
        self.advance(&mut events);
        events
    }

    fn type_char(&mut self, c: char, events: &mut Vec<TutorEvent>) {
        if self.session.input_character(c).is_none() {
            return;
        }

        let metrics = self.session.metrics();
        events.push(TutorEvent::MetricsTick(metrics));

        if self.session.status() == SessionStatus::PhraseComplete {
            events.push(TutorEvent::PhraseComplete {
                phrase_index: self.session.phrase_index(),
                metrics,
            });
            let obs = self.observation(metrics, false);
            self.evaluate_achievements(&obs, events);

            if self.config.auto_advance {
                self.advance(events);
            }
        }
    }

    fn advance(&mut self, events: &mut Vec<TutorEvent>) {
        if !self.session.advance_phrase() {
            return;
        }
        if let Some(summary) = self.session.summary() {
            self.complete_lesson(summary, events);
        }
    }

    fn complete_lesson(&mut self, summary: LessonSummary, events: &mut Vec<TutorEvent>) {
        let record = SessionRecord::from_summary(&summary, self.now());
        match self.history_store.append(&record) {
            Ok(()) => info!(
                "recorded '{}' at {} wpm, {:.0}% accuracy",
                summary.title, record.wpm, record.accuracy
            ),
            Err(e) => warn!("could not save typing history: {e}"),
        }
        self.history.push(record);

        let obs = self.observation(summary.as_metrics(), true);
        events.push(TutorEvent::LessonComplete(summary));
        self.evaluate_achievements(&obs, events);
    }

    fn observation(&self, metrics: Metrics, session_completed: bool) -> Observation {
        Observation {
            metrics,
            session_completed,
            sessions_completed: self.history.len(),
            day_streak: day_streak(&self.history, self.today()),
        }
    }

    fn evaluate_achievements(&mut self, obs: &Observation, events: &mut Vec<TutorEvent>) {
        let before = self.achievements.clone();
        let unlocked = evaluate(&mut self.achievements, obs);

        if self.achievements != before {
            if let Err(e) = self.achievement_store.save(&self.achievements) {
                warn!("could not save achievements: {e}");
            }
        }

        events.extend(unlocked.into_iter().map(TutorEvent::AchievementUnlocked));
    }

    fn now(&self) -> DateTime<Local> {
        DateTime::from(self.clock.now())
    }

    fn today(&self) -> chrono::NaiveDate {
        self.now().date_naive()
    }
}
