//! The duration store contract.
//!
//! A duration store maps a calendar day (`YYYY-MM-DD`) to per-domain accumulated
//! milliseconds. Writes only ever add: splitting one delta into several
//! `accumulate` calls for the same day must produce the same totals as a single
//! call with the summed delta.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};
use thiserror::Error;

/// Date-key -> domain -> milliseconds.
pub type DailyTotals = BTreeMap<String, BTreeMap<String, i64>>;

/// Errors raised by store implementations in this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The timestamp cannot be mapped to a calendar day.
    #[error("timestamp out of range: {0}")]
    InvalidTimestamp(i64),
}

/// Time zone used to bucket timestamps into calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateZone {
    /// The host's local time zone.
    #[default]
    Local,
    /// A fixed UTC offset.
    Fixed(FixedOffset),
}

impl DateZone {
    /// UTC, mostly useful for tests.
    pub fn utc() -> Self {
        Self::Fixed(Utc.fix())
    }

    /// Returns the calendar day containing `at_ms`.
    pub fn date_of(self, at_ms: i64) -> Result<NaiveDate, StoreError> {
        let utc = DateTime::<Utc>::from_timestamp_millis(at_ms)
            .ok_or(StoreError::InvalidTimestamp(at_ms))?;
        Ok(match self {
            Self::Local => utc.with_timezone(&Local).date_naive(),
            Self::Fixed(offset) => utc.with_timezone(&offset).date_naive(),
        })
    }
}

/// Formats a calendar day as a store date-key.
pub fn format_date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Derives the date-key for a timestamp in the given zone.
pub fn date_key(at_ms: i64, zone: DateZone) -> Result<String, StoreError> {
    zone.date_of(at_ms).map(format_date_key)
}

/// Append-only accumulator keyed by date and domain.
pub trait DurationStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Adds `delta_ms` to the `(date_key(at_ms), domain)` total.
    ///
    /// Must be a no-op when `delta_ms <= 0` or `domain` is empty.
    fn accumulate(&mut self, domain: &str, delta_ms: i64, at_ms: i64) -> Result<(), Self::Error>;
}

/// An in-process duration store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    zone: DateZone,
    totals: DailyTotals,
}

impl MemoryStore {
    /// Creates an empty store bucketing days in `zone`.
    pub fn new(zone: DateZone) -> Self {
        Self {
            zone,
            totals: DailyTotals::new(),
        }
    }

    /// Returns the accumulated total for a day and domain, or 0.
    pub fn total(&self, date_key: &str, domain: &str) -> i64 {
        self.totals
            .get(date_key)
            .and_then(|domains| domains.get(domain))
            .copied()
            .unwrap_or(0)
    }

    /// Returns every stored total.
    pub fn daily_totals(&self) -> &DailyTotals {
        &self.totals
    }

    /// Removes all totals.
    pub fn clear(&mut self) {
        self.totals.clear();
    }
}

impl DurationStore for MemoryStore {
    type Error = StoreError;

    fn accumulate(&mut self, domain: &str, delta_ms: i64, at_ms: i64) -> Result<(), StoreError> {
        if domain.is_empty() || delta_ms <= 0 {
            return Ok(());
        }
        let key = date_key(at_ms, self.zone)?;
        *self
            .totals
            .entry(key)
            .or_default()
            .entry(domain.to_string())
            .or_insert(0) += delta_ms;
        Ok(())
    }
}
