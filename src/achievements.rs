use crate::metrics::Metrics;
use log::info;
use serde::{Deserialize, Serialize};

/// A persistent milestone. `progress` only ever grows and `unlocked` never reverts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub unlocked: bool,
    pub progress: f64,
    #[serde(rename = "required")]
    pub threshold: f64,
}

impl Achievement {
    pub fn new(id: &str, title: &str, description: &str, threshold: f64) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            unlocked: false,
            progress: 0.0,
            threshold,
        }
    }

    /// Progress towards the threshold as a percentage, capped at 100.
    pub fn percent(&self) -> f64 {
        if self.threshold <= 0.0 {
            return 100.0;
        }
        (self.progress / self.threshold * 100.0).clamp(0.0, 100.0)
    }
}

/// Built-in achievement definitions, all locked.
pub fn default_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new("fast_typer_50", "Fast Typer", "Reach 50 WPM", 50.0),
        Achievement::new("accuracy_90", "Accuracy Master", "Achieve 90% accuracy", 90.0),
        Achievement::new(
            "lesson_complete",
            "Lesson Complete",
            "Complete your first lesson",
            1.0,
        ),
        Achievement::new(
            "speed_demon",
            "Speed Demon",
            "Reach 100 WPM in a single lesson",
            100.0,
        ),
        Achievement::new(
            "perfectionist",
            "Perfectionist",
            "Complete a lesson with 100% accuracy",
            100.0,
        ),
        Achievement::new("lesson_master", "Lesson Master", "Complete 10 lessons", 10.0),
        Achievement::new(
            "streak_7",
            "7-Day Streak",
            "Complete lessons for 7 days in a row",
            7.0,
        ),
    ]
}

/// Append any built-in definitions missing from a stored list.
pub fn merge_with_defaults(mut stored: Vec<Achievement>) -> Vec<Achievement> {
    for default in default_achievements() {
        if !stored.iter().any(|a| a.id == default.id) {
            stored.push(default);
        }
    }
    stored
}

/// What the evaluator gets to look at
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Observation {
    pub metrics: Metrics,
    /// A lesson or standalone text was just finished.
    pub session_completed: bool,
    /// Completed sessions in the history, including this one.
    pub sessions_completed: usize,
    /// Consecutive days with at least one completed session.
    pub day_streak: u32,
}

impl Observation {
    /// Live metrics while typing; nothing has been completed.
    pub fn live(metrics: Metrics) -> Self {
        Self {
            metrics,
            ..Self::default()
        }
    }
}

/// How an achievement id turns an observation into progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementRule {
    MaxWpm,
    /// Wpm of a whole finished lesson; live and per-phrase bursts do not count.
    CompletedWpm,
    MaxAccuracy,
    CompletedAccuracy,
    FirstCompletion,
    CompletedSessions,
    DayStreak,
}

impl AchievementRule {
    pub fn for_id(id: &str) -> Option<Self> {
        match id {
            "fast_typer_50" | "fast_typer" => Some(Self::MaxWpm),
            "speed_demon" => Some(Self::CompletedWpm),
            "accuracy_90" | "accuracy_master" => Some(Self::MaxAccuracy),
            "perfectionist" => Some(Self::CompletedAccuracy),
            "lesson_complete" => Some(Self::FirstCompletion),
            "lesson_master" => Some(Self::CompletedSessions),
            "streak_7" => Some(Self::DayStreak),
            _ => None,
        }
    }

    /// Candidate progress. Speed and accuracy only count once something was typed,
    /// so the 100% accuracy of an untouched session never unlocks anything.
    pub fn candidate(self, obs: &Observation) -> f64 {
        let typed_something = obs.metrics.total_chars > 0;
        match self {
            Self::MaxWpm if typed_something => obs.metrics.wpm,
            Self::CompletedWpm if obs.session_completed && typed_something => obs.metrics.wpm,
            Self::MaxAccuracy if typed_something => obs.metrics.accuracy,
            Self::CompletedAccuracy if obs.session_completed && typed_something => {
                obs.metrics.accuracy
            }
            Self::FirstCompletion if obs.session_completed => 1.0,
            Self::CompletedSessions => obs.sessions_completed as f64,
            Self::DayStreak => f64::from(obs.day_streak),
            _ => 0.0,
        }
    }
}

/// Fold `obs` into `achievements` and return those unlocked by this call.
///
/// Idempotent: re-evaluating the same observation changes nothing and reports
/// nothing new.
pub fn evaluate(achievements: &mut [Achievement], obs: &Observation) -> Vec<Achievement> {
    let mut newly_unlocked = Vec::new();

    for achievement in achievements.iter_mut() {
        if let Some(rule) = AchievementRule::for_id(&achievement.id) {
            achievement.progress = achievement.progress.max(rule.candidate(obs));
        }

        if !achievement.unlocked && achievement.progress >= achievement.threshold {
            achievement.unlocked = true;
            info!("achievement unlocked: {}", achievement.title);
            newly_unlocked.push(achievement.clone());
        }
    }

    newly_unlocked
}
