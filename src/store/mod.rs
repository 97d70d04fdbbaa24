//! Persistent store for facts, instances, and messages.
//!
//! [`Store`] owns one SQLite connection to the shared database file. Every
//! operation is a single statement (its own implicit transaction); there is no
//! in-process coordination beyond the connection mutex, and cross-process
//! safety comes from SQLite's WAL mode and busy timeout.
//!
//! Timestamps are written as fixed-width RFC 3339 UTC strings with microsecond
//! precision, so comparing and ordering the text columns is chronological.

pub mod facts;
pub mod instances;
pub mod messages;
pub mod types;

pub use types::{Fact, FactFilter, Instance, Message};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::db;
use crate::error::StoreError;

/// Upper bound on rows returned by a single fact query.
pub const MAX_LIMIT: i64 = 1000;
/// Rows returned when the caller passes a zero or negative limit.
pub const DEFAULT_LIMIT: i64 = 100;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Handle to the shared database.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open the on-disk store, creating the file and parent directory if needed.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let conn = db::open_database(path, busy_timeout)?;
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = db::open_memory_database()?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

/// Clamp a requested row limit into `[1, MAX_LIMIT]`; zero or negative means
/// [`DEFAULT_LIMIT`].
pub fn clamp_limit(limit: i64) -> i64 {
    if limit <= 0 {
        DEFAULT_LIMIT
    } else {
        limit.min(MAX_LIMIT)
    }
}

/// Wrap a free-text query as a single FTS5 phrase.
///
/// Quotes are doubled and the whole string is quoted, so FTS5 never sees an
/// operator (`OR`, `NOT`, `*`, `NEAR`, column filters, ...), only literal text.
pub fn sanitize_fts_query(query: &str) -> String {
    format!("\"{}\"", query.replace('"', "\"\""))
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// The current time at stored precision, with its text form.
pub(crate) fn now_timestamp() -> (DateTime<Utc>, String) {
    let now = Utc::now().trunc_subsecs(6);
    (now, format_timestamp(now))
}

/// Read a timestamp column written by [`format_timestamp`].
pub(crate) fn timestamp_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(idx, &raw)
}

pub(crate) fn optional_timestamp_column(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| parse_timestamp(idx, &s)).transpose()
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
