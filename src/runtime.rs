use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::Config;

/// Source of wall-clock time for session timing
pub trait Clock: fmt::Debug + Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Production clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock that only moves when told to. Clones share the same instant, so a test can
/// keep one handle and give another to the session under test.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<SystemTime>>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: SystemTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A single logical key accepted by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    Enter,
    Escape,
}

impl KeyInput {
    /// Translate a terminal key event. Releases, modifier chords and
    /// non-text keys are ignored.
    pub fn from_key_event(key: &KeyEvent) -> Option<Self> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return None;
        }

        match key.code {
            KeyCode::Char(c) => Some(Self::Char(c)),
            KeyCode::Backspace => Some(Self::Backspace),
            KeyCode::Enter => Some(Self::Enter),
            KeyCode::Esc => Some(Self::Escape),
            _ => None,
        }
    }

    /// Translate a DOM-style key name: a single character, or one of
    /// `Backspace`, `Enter`, `Escape`.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "Backspace" => Some(Self::Backspace),
            "Enter" => Some(Self::Enter),
            "Escape" => Some(Self::Escape),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Self::Char(c)),
                    _ => None,
                }
            }
        }
    }
}

/// Unified event type consumed by the tutor loop
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Key(KeyInput),
    Tick,
}

/// Source of input events (keyboard, forwarded UI events, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<InputEvent, RecvTimeoutError>;
}

/// Event source fed over a channel by whatever owns the real input device
pub struct ChannelEventSource {
    rx: Receiver<InputEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<InputEvent>) -> Self {
        Self { rx }
    }

    /// Create a connected sender/source pair.
    pub fn channel() -> (Sender<InputEvent>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::new(rx))
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<InputEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Tick at the configured interval. Zero is bumped to 1ms.
    pub fn from_config(config: &Config) -> Self {
        Self::from_millis(config.tick_interval_ms.max(1))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runner that advances the tutor one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to the tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> InputEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                InputEvent::Tick
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, es) = ChannelEventSource::channel();
        let runner = Runner::new(es, FixedTicker::from_millis(1));

        assert_matches!(runner.step(), InputEvent::Tick);
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, es) = ChannelEventSource::channel();
        tx.send(InputEvent::Key(KeyInput::Char('a'))).unwrap();
        let runner = Runner::new(es, FixedTicker::from_millis(10));

        assert_matches!(runner.step(), InputEvent::Key(KeyInput::Char('a')));
    }

    #[test]
    fn ticker_follows_config() {
        let default = FixedTicker::from_config(&Config::default());
        assert_eq!(default.interval(), Duration::from_secs(1));

        let fast = Config {
            tick_interval_ms: 250,
            ..Config::default()
        };
        assert_eq!(
            FixedTicker::from_config(&fast).interval(),
            Duration::from_millis(250)
        );

        let zero = Config {
            tick_interval_ms: 0,
            ..Config::default()
        };
        assert_eq!(
            FixedTicker::from_config(&zero).interval(),
            Duration::from_millis(1)
        );
    }

    #[test]
    fn step_ticks_after_sender_dropped() {
        let (tx, es) = ChannelEventSource::channel();
        drop(tx);
        let runner = Runner::new(es, FixedTicker::from_millis(1));

        assert_matches!(runner.step(), InputEvent::Tick);
    }

    #[test]
    fn key_events_translate() {
        let plain = |code| KeyEvent::new(code, KeyModifiers::NONE);

        assert_eq!(
            KeyInput::from_key_event(&plain(KeyCode::Char('q'))),
            Some(KeyInput::Char('q'))
        );
        assert_eq!(
            KeyInput::from_key_event(&KeyEvent::new(KeyCode::Char('Q'), KeyModifiers::SHIFT)),
            Some(KeyInput::Char('Q'))
        );
        assert_eq!(
            KeyInput::from_key_event(&plain(KeyCode::Backspace)),
            Some(KeyInput::Backspace)
        );
        assert_eq!(
            KeyInput::from_key_event(&plain(KeyCode::Enter)),
            Some(KeyInput::Enter)
        );
        assert_eq!(
            KeyInput::from_key_event(&plain(KeyCode::Esc)),
            Some(KeyInput::Escape)
        );
    }

    #[test]
    fn key_events_ignored() {
        assert_eq!(
            KeyInput::from_key_event(&KeyEvent::new(KeyCode::Left, KeyModifiers::NONE)),
            None
        );
        assert_eq!(
            KeyInput::from_key_event(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            None
        );
        assert_eq!(
            KeyInput::from_key_event(&KeyEvent::new_with_kind(
                KeyCode::Char('a'),
                KeyModifiers::NONE,
                KeyEventKind::Release,
            )),
            None
        );
    }

    #[test]
    fn key_names_translate() {
        assert_eq!(KeyInput::from_key_name("a"), Some(KeyInput::Char('a')));
        assert_eq!(KeyInput::from_key_name(" "), Some(KeyInput::Char(' ')));
        assert_eq!(KeyInput::from_key_name("é"), Some(KeyInput::Char('é')));
        assert_eq!(KeyInput::from_key_name("Backspace"), Some(KeyInput::Backspace));
        assert_eq!(KeyInput::from_key_name("Enter"), Some(KeyInput::Enter));
        assert_eq!(KeyInput::from_key_name("Escape"), Some(KeyInput::Escape));
        assert_eq!(KeyInput::from_key_name("Shift"), None);
        assert_eq!(KeyInput::from_key_name("ArrowLeft"), None);
        assert_eq!(KeyInput::from_key_name(""), None);
    }

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::default();
        let handle = clock.clone();
        let before = clock.now();

        handle.advance(Duration::from_secs(3));

        assert_eq!(clock.now().duration_since(before).unwrap(), Duration::from_secs(3));
    }
}
