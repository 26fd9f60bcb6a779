use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::session::LessonSummary;
use chrono::{DateTime, Days, Local, NaiveDate};
use itertools::Itertools;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// One completed lesson or standalone text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub wpm: f64,
    pub accuracy: f64,
    /// Seconds spent typing.
    pub time: f64,
    #[serde(rename = "textLength")]
    pub text_length: usize,
    pub date: DateTime<Local>,
}

impl SessionRecord {
    pub fn from_summary(summary: &LessonSummary, date: DateTime<Local>) -> Self {
        Self {
            wpm: summary.wpm,
            accuracy: summary.accuracy,
            time: summary.total_seconds,
            text_length: summary.total_chars,
            date,
        }
    }
}

/// Append-only log of completed sessions
pub trait HistoryStore: fmt::Debug {
    fn append(&self, record: &SessionRecord) -> Result<()>;
    fn load(&self) -> Result<Vec<SessionRecord>>;
}

/// History kept in a SQLite database
#[derive(Debug)]
pub struct SqliteHistoryStore {
    conn: Connection,
}

impl SqliteHistoryStore {
    /// Open the database at the default location, creating it if needed.
    pub fn new() -> Result<Self> {
        let path = AppDirs::history_db_path()
            .unwrap_or_else(|| PathBuf::from(crate::app_dirs::HISTORY_DB_FILE));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS typing_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                wpm REAL NOT NULL,
                accuracy REAL NOT NULL,
                time_secs REAL NOT NULL,
                text_length INTEGER NOT NULL,
                date TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_typing_history_date ON typing_history(date)",
            [],
        )?;

        Ok(Self { conn })
    }

    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM typing_history", [])?;
        Ok(())
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn append(&self, record: &SessionRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO typing_history (wpm, accuracy, time_secs, text_length, date)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.wpm,
                record.accuracy,
                record.time,
                record.text_length as i64,
                record.date.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn load(&self) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT wpm, accuracy, time_secs, text_length, date FROM typing_history ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            let date_str: String = row.get(4)?;
            let date = DateTime::parse_from_rfc3339(&date_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        4,
                        "date".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);
            let text_length: i64 = row.get(3)?;

            Ok(SessionRecord {
                wpm: row.get(0)?,
                accuracy: row.get(1)?,
                time: row.get(2)?,
                text_length: text_length.max(0) as usize,
                date,
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }
}

/// In-process history; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    records: Arc<Mutex<Vec<SessionRecord>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&self, record: &SessionRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn load(&self) -> Result<Vec<SessionRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

/// Consecutive days with at least one session, ending today or yesterday.
pub fn day_streak(records: &[SessionRecord], today: NaiveDate) -> u32 {
    let days: Vec<NaiveDate> = records
        .iter()
        .map(|r| r.date.date_naive())
        .sorted_by(|a, b| b.cmp(a))
        .dedup()
        .collect();

    let Some(&latest) = days.first() else {
        return 0;
    };
    let yesterday = today.checked_sub_days(Days::new(1));
    if latest != today && Some(latest) != yesterday {
        return 0;
    }

    let mut streak = 1;
    for (newer, older) in days.iter().tuple_windows() {
        if newer.checked_sub_days(Days::new(1)) == Some(*older) {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Aggregates shown on the progress page
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HistorySummary {
    pub sessions_completed: usize,
    pub best_wpm: f64,
    pub best_accuracy: f64,
    pub average_wpm: f64,
    pub total_time: f64,
    pub day_streak: u32,
}

impl HistorySummary {
    pub fn from_records(records: &[SessionRecord], today: NaiveDate) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let wpms = records.iter().map(|r| r.wpm);
        Self {
            sessions_completed: records.len(),
            best_wpm: wpms.clone().fold(0.0, f64::max),
            best_accuracy: records.iter().map(|r| r.accuracy).fold(0.0, f64::max),
            average_wpm: wpms.sum::<f64>() / records.len() as f64,
            total_time: records.iter().map(|r| r.time).sum(),
            day_streak: day_streak(records, today),
        }
    }

    /// Experience points: 100 per session plus 5 per best-wpm point.
    pub fn xp(&self) -> u64 {
        self.sessions_completed as u64 * 100 + self.best_wpm.round().max(0.0) as u64 * 5
    }

    /// Levels double in cost: level `n` is reached at `(2^(n-1) - 1) * 100` xp.
    pub fn level(&self) -> u32 {
        (self.xp() as f64 / 100.0 + 1.0).log2().floor() as u32 + 1
    }

    pub fn xp_to_next_level(&self) -> u64 {
        let next = ((1u64 << self.level()) - 1) * 100;
        next.saturating_sub(self.xp())
    }
}

/// Write the history as CSV with a header row.
pub fn export_csv<W: io::Write>(records: &[SessionRecord], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}
