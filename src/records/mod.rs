//! Storage operations for people, themes, actions and conversations.
//!
//! Every function is synchronous and takes a borrowed [`Connection`]; async
//! callers run them inside `tokio::task::spawn_blocking`. A missing record is
//! always reported as [`StoreError::NotFound`], never folded into a generic
//! database error.

pub mod actions;
pub mod conversations;
pub mod people;
pub mod stats;
pub mod themes;
pub mod types;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row};

use crate::id::Id;

/// Storage failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: Id },
    #[error("statement interrupted")]
    Interrupted,
    #[error("database error: {0}")]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::OperationInterrupted) => Self::Interrupted,
            _ => Self::Sqlite(err),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Fixed-width UTC text so stored timestamps sort lexically.
pub(crate) fn stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Read an RFC 3339 text column back into a timestamp.
pub(crate) fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

/// Empty optional text is stored as NULL.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Fail with `NotFound` unless `table` has a row with this id.
pub(crate) fn ensure_exists(
    conn: &Connection,
    table: &str,
    resource: &'static str,
    id: Id,
) -> StoreResult<()> {
    let found: Option<i64> = conn
        .query_row(&format!("SELECT 1 FROM {table} WHERE id = ?1"), [id], |row| {
            row.get(0)
        })
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(StoreError::NotFound { resource, id }),
    }
}
