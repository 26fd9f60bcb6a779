use crate::catalog::Lesson;
use crate::error::{Result, TutorError};
use crate::metrics::{self, Metrics};
use crate::runtime::Clock;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum SessionStatus {
    Idle,
    Active,
    Paused,
    PhraseComplete,
    LessonComplete,
}

/// Which keystroke is allowed to start the clock on an idle phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPolicy {
    /// Only the first expected character starts the phrase; anything else is ignored.
    #[default]
    FirstCorrectKey,
    /// Any character starts the phrase and is scored.
    AnyKey,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Highlighting state of one target character
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum CharState {
    Correct,
    Incorrect,
    Current,
    Pending,
}

/// Metrics captured at the moment a phrase was completed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhraseResult {
    pub phrase_index: usize,
    pub metrics: Metrics,
}

/// Final stats for a completed lesson (or standalone text)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonSummary {
    pub title: String,
    pub phrases: Vec<PhraseResult>,
    pub wpm: f64,
    pub accuracy: f64,
    pub total_seconds: f64,
    pub correct_chars: usize,
    pub total_chars: usize,
    pub errors: usize,
}

impl LessonSummary {
    fn from_results(title: &str, phrases: Vec<PhraseResult>) -> Self {
        let total_seconds: f64 = phrases.iter().map(|p| p.metrics.elapsed_seconds).sum();
        let correct_chars: usize = phrases.iter().map(|p| p.metrics.correct_chars).sum();
        let total_chars: usize = phrases.iter().map(|p| p.metrics.total_chars).sum();
        let errors: usize = phrases.iter().map(|p| p.metrics.errors).sum();

        Self {
            title: title.to_string(),
            wpm: metrics::wpm(total_chars, total_seconds),
            accuracy: correct_chars as f64 / total_chars.max(1) as f64 * 100.0,
            total_seconds,
            correct_chars,
            total_chars,
            errors,
            phrases,
        }
    }

    /// Summary as metrics, for achievement evaluation.
    pub fn as_metrics(&self) -> Metrics {
        Metrics {
            wpm: self.wpm,
            accuracy: self.accuracy,
            elapsed_seconds: self.total_seconds,
            correct_chars: self.correct_chars,
            total_chars: self.total_chars,
            errors: self.errors,
        }
    }
}

/// The authoritative state of one learner working through a lesson.
///
/// Every transition is a silent no-op when called from a state that forbids it.
#[derive(Debug)]
pub struct Session {
    lesson: Lesson,
    phrase_index: usize,
    target: Vec<char>,
    typed: Vec<char>,
    error_count: usize,
    started_at: Option<SystemTime>,
    status: SessionStatus,
    start_policy: StartPolicy,
    results: Vec<PhraseResult>,
    clock: Arc<dyn Clock>,
}

impl Session {
    pub fn new(lesson: Lesson, start_policy: StartPolicy, clock: Arc<dyn Clock>) -> Result<Self> {
        lesson.validate()?;
        let target = lesson.phrase(0).chars().collect();

        Ok(Self {
            lesson,
            phrase_index: 0,
            target,
            typed: Vec::new(),
            error_count: 0,
            started_at: None,
            status: SessionStatus::Idle,
            start_policy,
            results: Vec::new(),
            clock,
        })
    }

    /// A single-phrase session over free-standing text.
    pub fn for_text(
        text: impl Into<String>,
        start_policy: StartPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(TutorError::EmptyText);
        }
        Self::new(Lesson::standalone(text), start_policy, clock)
    }

    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn phrase_index(&self) -> usize {
        self.phrase_index
    }

    pub fn phrase_count(&self) -> usize {
        self.lesson.phrase_count()
    }

    pub fn is_last_phrase(&self) -> bool {
        self.phrase_index + 1 >= self.lesson.phrase_count()
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn target_text(&self) -> &str {
        self.lesson.phrase(self.phrase_index)
    }

    pub fn typed(&self) -> &[char] {
        &self.typed
    }

    pub fn typed_text(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    pub fn start_policy(&self) -> StartPolicy {
        self.start_policy
    }

    /// Next character the learner is expected to type.
    pub fn expected_char(&self) -> Option<char> {
        self.target.get(self.typed.len()).copied()
    }

    /// Results of the phrases completed so far, in order.
    pub fn phrase_results(&self) -> &[PhraseResult] {
        &self.results
    }

    pub fn metrics(&self) -> Metrics {
        metrics::compute(
            &self.target,
            &self.typed,
            self.error_count,
            self.started_at,
            self.clock.now(),
        )
    }

    pub fn completion(&self) -> f64 {
        metrics::completion(self.typed.len(), self.target.len())
    }

    pub fn char_states(&self) -> Vec<CharState> {
        self.target
            .iter()
            .enumerate()
            .map(|(i, expected)| match self.typed.get(i) {
                Some(typed) if typed == expected => CharState::Correct,
                Some(_) => CharState::Incorrect,
                None if i == self.typed.len() => CharState::Current,
                None => CharState::Pending,
            })
            .collect()
    }

    /// Final stats, available once the lesson is complete.
    pub fn summary(&self) -> Option<LessonSummary> {
        (self.status == SessionStatus::LessonComplete)
            .then(|| LessonSummary::from_results(&self.lesson.title, self.results.clone()))
    }

    /// Start or resume. The clock anchor is only set once per phrase, so
    /// resuming from a pause keeps counting from the original start.
    pub fn start(&mut self) -> bool {
        match self.status {
            SessionStatus::Idle | SessionStatus::Paused => {
                self.status = SessionStatus::Active;
                if self.started_at.is_none() {
                    self.started_at = Some(self.clock.now());
                }
                debug!("phrase {} active", self.phrase_index);
                true
            }
            _ => false,
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.status != SessionStatus::Active {
            return false;
        }
        self.status = SessionStatus::Paused;
        debug!("phrase {} paused", self.phrase_index);
        true
    }

    /// Type one character. Returns `None` when the keystroke was ignored.
    pub fn input_character(&mut self, c: char) -> Option<Outcome> {
        if self.status == SessionStatus::Idle {
            let starts = match self.start_policy {
                StartPolicy::FirstCorrectKey => self.target.first() == Some(&c),
                StartPolicy::AnyKey => true,
            };
            if !starts {
                return None;
            }
            self.start();
        }

        if self.status != SessionStatus::Active {
            return None;
        }
        let expected = self.expected_char()?;

        let outcome = if c == expected {
            Outcome::Correct
        } else {
            self.error_count += 1;
            Outcome::Incorrect
        };
        self.typed.push(c);

        if self.typed.len() == self.target.len() {
            self.status = SessionStatus::PhraseComplete;
            self.results.push(PhraseResult {
                phrase_index: self.phrase_index,
                metrics: self.metrics(),
            });
            debug!(
                "phrase {} complete with {} errors",
                self.phrase_index, self.error_count
            );
        }

        Some(outcome)
    }

    /// Remove the last typed character. Mistakes already counted stay counted.
    pub fn backspace(&mut self) -> bool {
        if self.status != SessionStatus::Active {
            return false;
        }
        self.typed.pop().is_some()
    }

    pub fn advance_phrase(&mut self) -> bool {
        if self.status != SessionStatus::PhraseComplete {
            return false;
        }

        if self.is_last_phrase() {
            self.status = SessionStatus::LessonComplete;
            debug!("lesson '{}' complete", self.lesson.title);
        } else {
            self.load_phrase(self.phrase_index + 1);
        }
        true
    }

    /// Restart the current phrase.
    pub fn reset(&mut self) {
        self.load_phrase(self.phrase_index);
    }

    /// Restart the whole lesson from its first phrase.
    pub fn reset_lesson(&mut self) {
        self.load_phrase(0);
    }

    /// Restart at `index`, or at the first phrase when `index` is out of range.
    pub fn jump_to_phrase(&mut self, index: usize) {
        let index = if index < self.lesson.phrase_count() {
            index
        } else {
            0
        };
        self.load_phrase(index);
    }

    fn load_phrase(&mut self, index: usize) {
        self.phrase_index = index;
        self.target = self.lesson.phrase(index).chars().collect();
        self.typed.clear();
        self.error_count = 0;
        self.started_at = None;
        self.status = SessionStatus::Idle;
        self.results.truncate(index);
    }
}
