use thiserror::Error;

/// Errors surfaced by constructors and persistence. State transitions on a
/// [`crate::session::Session`] never fail; invalid calls are ignored.
#[derive(Error, Debug)]
pub enum TutorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("lesson catalog is empty")]
    EmptyCatalog,

    #[error("lesson '{0}' has no phrases")]
    EmptyLesson(String),

    #[error("lesson '{title}' has an empty phrase at index {index}")]
    EmptyPhrase { title: String, index: usize },

    #[error("target text is empty")]
    EmptyText,

    #[error("embedded file not found: {0}")]
    MissingAsset(String),
}

pub type Result<T> = std::result::Result<T, TutorError>;
