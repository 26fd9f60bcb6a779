// Typing-session engine: the presentation layer feeds key events and ticks in,
// and reads metrics, session state and events back out.
pub mod achievements;
pub mod app_dirs;
pub mod catalog;
pub mod config;
pub mod error;
pub mod history;
pub mod metrics;
pub mod persistence;
pub mod runtime;
pub mod session;
pub mod tutor;

pub use error::{Result, TutorError};
pub use tutor::{Tutor, TutorEvent};
