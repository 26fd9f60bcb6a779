use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Standard "characters per word" convention used for WPM.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Speed and accuracy derived from a session snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub wpm: f64,
    pub accuracy: f64,
    pub elapsed_seconds: f64,
    pub correct_chars: usize,
    pub total_chars: usize,
    pub errors: usize,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            wpm: 0.0,
            accuracy: 100.0,
            elapsed_seconds: 0.0,
            correct_chars: 0,
            total_chars: 0,
            errors: 0,
        }
    }
}

impl Metrics {
    /// Accuracy rounded to a whole percentage, as displayed.
    pub fn rounded_accuracy(&self) -> u32 {
        self.accuracy.round() as u32
    }
}

/// Derive metrics for `typed` against `target`.
///
/// Pure. Before the first keystroke (`started_at == None`) the result is the
/// zero snapshot with 100% accuracy.
pub fn compute(
    target: &[char],
    typed: &[char],
    error_count: usize,
    started_at: Option<SystemTime>,
    now: SystemTime,
) -> Metrics {
    let Some(started_at) = started_at else {
        return Metrics::default();
    };

    let elapsed_seconds = now
        .duration_since(started_at)
        .unwrap_or_default()
        .as_secs_f64();

    let correct_chars = typed
        .iter()
        .zip(target.iter())
        .filter(|(typed, expected)| typed == expected)
        .count();

    let accuracy = if typed.is_empty() {
        100.0
    } else {
        correct_chars as f64 / typed.len() as f64 * 100.0
    };

    Metrics {
        wpm: wpm(typed.len(), elapsed_seconds),
        accuracy,
        elapsed_seconds,
        correct_chars,
        total_chars: typed.len(),
        errors: error_count,
    }
}

/// Rounded words per minute for `chars` typed over `elapsed_seconds`.
pub fn wpm(chars: usize, elapsed_seconds: f64) -> f64 {
    if elapsed_seconds <= 0.0 {
        return 0.0;
    }

    let raw = (chars as f64 / CHARS_PER_WORD) / (elapsed_seconds / 60.0);
    if raw.is_finite() {
        raw.round()
    } else {
        0.0
    }
}

/// Share of the target already typed, in percent. An empty target counts as done.
pub fn completion(typed_len: usize, target_len: usize) -> f64 {
    if target_len == 0 {
        return 100.0;
    }
    (typed_len as f64 / target_len as f64 * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_000) + Duration::from_secs(secs)
    }

    #[test]
    fn test_not_started_is_zero_snapshot() {
        let m = compute(&chars("hello"), &[], 0, None, at(10));

        assert_eq!(m.wpm, 0.0);
        assert_eq!(m.accuracy, 100.0);
        assert_eq!(m.elapsed_seconds, 0.0);
        assert_eq!(m.correct_chars, 0);
        assert_eq!(m.total_chars, 0);
    }

    #[test]
    fn test_started_but_nothing_typed() {
        let m = compute(&chars("hello"), &[], 0, Some(at(0)), at(3));

        assert_eq!(m.accuracy, 100.0);
        assert_eq!(m.wpm, 0.0);
        assert_eq!(m.elapsed_seconds, 3.0);
    }

    #[test]
    fn test_backspaced_to_empty_is_full_accuracy() {
        let m = compute(&chars("hello"), &[], 2, Some(at(0)), at(4));

        assert_eq!(m.accuracy, 100.0);
        assert_eq!(m.errors, 2);
        assert_eq!(m.total_chars, 0);
    }

    #[test]
    fn test_perfect_input() {
        let target = chars("the cat sat on the mat!!");
        let m = compute(&target, &target, 0, Some(at(0)), at(60));

        assert_eq!(m.accuracy, 100.0);
        assert_eq!(m.correct_chars, 24);
        assert_eq!(m.total_chars, 24);
        // 24 chars / 5 = 4.8 words over one minute
        assert_eq!(m.wpm, 5.0);
    }

    #[test]
    fn test_single_mistake_accuracy() {
        let target = chars("abcd");
        let m = compute(&target, &chars("abxd"), 1, Some(at(0)), at(6));

        assert_eq!(m.accuracy, 75.0);
        assert_eq!(m.correct_chars, 3);
        assert_eq!(m.errors, 1);
    }

    #[test]
    fn test_cat_scenario() {
        let m = compute(&chars("cat"), &chars("cax"), 1, Some(at(0)), at(1));

        assert!((m.accuracy - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.rounded_accuracy(), 67);
    }

    #[test]
    fn test_wpm_rounding() {
        // 10 chars in 12s: 2 words / 0.2 min
        assert_eq!(wpm(10, 12.0), 10.0);
        // 7 chars in a minute: 1.4 words
        assert_eq!(wpm(7, 60.0), 1.0);
        // 8 chars in a minute: 1.6 words
        assert_eq!(wpm(8, 60.0), 2.0);
    }

    #[test]
    fn test_wpm_zero_elapsed_is_zero() {
        assert_eq!(wpm(10, 0.0), 0.0);
        let m = compute(&chars("ab"), &chars("a"), 0, Some(at(5)), at(5));
        assert_eq!(m.wpm, 0.0);
    }

    #[test]
    fn test_clock_going_backwards_is_zero_elapsed() {
        let m = compute(&chars("ab"), &chars("a"), 0, Some(at(5)), at(2));

        assert_eq!(m.elapsed_seconds, 0.0);
        assert_eq!(m.wpm, 0.0);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let target = chars("repeatable");
        let typed = chars("repx");
        let first = compute(&target, &typed, 1, Some(at(0)), at(4));
        let second = compute(&target, &typed, 1, Some(at(0)), at(4));

        assert_eq!(first, second);
    }

    #[test]
    fn test_completion() {
        assert_eq!(completion(0, 4), 0.0);
        assert_eq!(completion(1, 4), 25.0);
        assert_eq!(completion(4, 4), 100.0);
        assert_eq!(completion(9, 4), 100.0);
        assert_eq!(completion(0, 0), 100.0);
    }
}
