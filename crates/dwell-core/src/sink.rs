//! Delivery of flushed time to a duration store.
//!
//! Transitions hand each [`Flush`] to a [`FlushSink`] and move on. A sink may
//! write synchronously, queue the flush for a background writer, or record it;
//! in every case the outcome is invisible to the state machine.

use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::store::DurationStore;

/// Elapsed time committed for a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flush {
    /// Domain the time belongs to.
    pub domain: Domain,
    /// Elapsed milliseconds, always positive.
    pub delta_ms: i64,
    /// Start of the accrual period; selects the date bucket.
    pub started_at_ms: i64,
}

impl Flush {
    /// Applies this flush to a store.
    pub fn apply<S: DurationStore>(&self, store: &mut S) -> Result<(), S::Error> {
        store.accumulate(self.domain.as_str(), self.delta_ms, self.started_at_ms)
    }
}

/// Fire-and-forget receiver of flushes.
pub trait FlushSink {
    /// Accepts a flush. Must not block on durable I/O and cannot fail.
    fn deliver(&mut self, flush: Flush);
}

/// Writes flushes straight into a store, logging failures.
#[derive(Debug, Default)]
pub struct StoreSink<S> {
    store: S,
}

impl<S: DurationStore> StoreSink<S> {
    /// Wraps a store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the wrapped store.
    pub const fn store(&self) -> &S {
        &self.store
    }
}

impl<S: DurationStore> FlushSink for StoreSink<S> {
    fn deliver(&mut self, flush: Flush) {
        if let Err(err) = flush.apply(&mut self.store) {
            tracing::warn!(
                domain = %flush.domain,
                delta_ms = flush.delta_ms,
                error = %err,
                "failed to persist tracked time"
            );
        }
    }
}

/// Keeps every flush in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSink {
    pub flushes: Vec<Flush>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    pub const fn new() -> Self {
        Self {
            flushes: Vec::new(),
        }
    }

    /// Removes and returns the recorded flushes.
    pub fn take(&mut self) -> Vec<Flush> {
        std::mem::take(&mut self.flushes)
    }
}

impl FlushSink for RecordingSink {
    fn deliver(&mut self, flush: Flush) {
        self.flushes.push(flush);
    }
}
