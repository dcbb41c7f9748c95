//! Storage layer for dwell.
//!
//! Persists per-day, per-domain accumulated durations using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved to a dedicated writer thread but cannot be
//! shared across threads without external synchronization.
//!
//! # Schema
//!
//! A single `durations` table keyed by `(date, domain)`:
//! - `date`: `YYYY-MM-DD` calendar day of the flush's accrual start, in the
//!   database's [`DateZone`]
//! - `domain`: normalized hostname
//! - `ms`: accumulated milliseconds, only ever increased by [`Database::accumulate`]
//!
//! Date keys sort lexicographically in chronological order, so day ranges are
//! plain string comparisons.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, params};
use thiserror::Error;

use dwell_core::{DailyTotals, DateZone, DurationStore, StoreError, date_key, format_date_key};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The flush timestamp could not be bucketed into a day.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A date range with its end before its start.
    #[error("invalid date range: {start} > {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
    zone: DateZone,
}

/// Accumulated time for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainTotal {
    pub domain: String,
    pub ms: i64,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open. Days are
    /// bucketed in the local time zone.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn,
            zone: DateZone::Local,
        };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            zone: DateZone::Local,
        };
        db.init()?;
        Ok(db)
    }

    /// Uses `zone` to derive date keys for subsequent writes.
    #[must_use]
    pub fn with_zone(mut self, zone: DateZone) -> Self {
        self.zone = zone;
        self
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Accumulated attention per calendar day and domain
            -- date: 'YYYY-MM-DD' in the writer's time zone
            -- ms: non-negative, only grows until an explicit clear
            CREATE TABLE IF NOT EXISTS durations (
                date TEXT NOT NULL,
                domain TEXT NOT NULL,
                ms INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (date, domain)
            );

            CREATE INDEX IF NOT EXISTS idx_durations_domain ON durations(domain);
            ",
        )?;
        Ok(())
    }

    /// Adds `delta_ms` to the total for `domain` on the day containing `at_ms`.
    ///
    /// No-op when `delta_ms <= 0` or `domain` is empty.
    pub fn accumulate(&self, domain: &str, delta_ms: i64, at_ms: i64) -> Result<(), DbError> {
        if domain.is_empty() || delta_ms <= 0 {
            return Ok(());
        }
        let date = date_key(at_ms, self.zone)?;
        self.conn.execute(
            "
            INSERT INTO durations (date, domain, ms) VALUES (?, ?, ?)
            ON CONFLICT(date, domain) DO UPDATE SET ms = durations.ms + excluded.ms
            ",
            params![date, domain, delta_ms],
        )?;
        tracing::trace!(%date, domain, delta_ms, "accumulated duration");
        Ok(())
    }

    /// Lists per-domain totals for one day, largest first.
    pub fn totals_for_date(&self, date: NaiveDate) -> Result<Vec<DomainTotal>, DbError> {
        self.totals_between(date, date)
    }

    /// Lists per-domain totals summed over an inclusive range of days, largest first.
    pub fn totals_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DomainTotal>, DbError> {
        if end < start {
            return Err(DbError::InvalidRange { start, end });
        }
        let mut stmt = self.conn.prepare(
            "
            SELECT domain, SUM(ms) AS total
            FROM durations
            WHERE date >= ? AND date <= ?
            GROUP BY domain
            ORDER BY total DESC, domain ASC
            ",
        )?;
        let rows = stmt.query_map(
            params![format_date_key(start), format_date_key(end)],
            |row| {
                Ok(DomainTotal {
                    domain: row.get(0)?,
                    ms: row.get(1)?,
                })
            },
        )?;
        let mut totals = Vec::new();
        for row in rows {
            totals.push(row?);
        }
        Ok(totals)
    }

    /// Returns every stored total keyed by date, then domain.
    pub fn daily_totals(&self) -> Result<DailyTotals, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT date, domain, ms
            FROM durations
            ORDER BY date ASC, domain ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            let date: String = row.get(0)?;
            let domain: String = row.get(1)?;
            let ms: i64 = row.get(2)?;
            Ok((date, domain, ms))
        })?;
        let mut totals = DailyTotals::new();
        for row in rows {
            let (date, domain, ms) = row?;
            totals.entry(date).or_default().insert(domain, ms);
        }
        Ok(totals)
    }

    /// Removes all stored durations, returning the number of rows deleted.
    pub fn clear(&self) -> Result<usize, DbError> {
        let deleted = self.conn.execute("DELETE FROM durations", [])?;
        tracing::info!(deleted, "cleared stored durations");
        Ok(deleted)
    }
}

impl DurationStore for Database {
    type Error = DbError;

    fn accumulate(&mut self, domain: &str, delta_ms: i64, at_ms: i64) -> Result<(), DbError> {
        Self::accumulate(self, domain, delta_ms, at_ms)
    }
}
