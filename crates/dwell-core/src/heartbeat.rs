//! Periodic flush of the open accrual.
//!
//! Tracked time normally reaches the store when an accrual closes. The heartbeat
//! bounds what an abrupt process exit can lose to one interval: it flushes the
//! elapsed time and rolls the start forward while the session stays open. A
//! late or skipped tick just produces one larger flush covering the gap.

use std::time::Duration;

use crate::clock::Clock;
use crate::sink::FlushSink;
use crate::tracker::Tracker;

/// Default heartbeat period.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

impl<C: Clock, S: FlushSink> Tracker<C, S> {
    /// Flushes the open accrual and restarts it at the current time.
    ///
    /// The only transition that flushes without clearing the domain. Does nothing
    /// unless tracking.
    pub fn on_heartbeat(&mut self) {
        if self.session.idle {
            return;
        }
        let (Some(domain), Some(started_at_ms)) =
            (self.session.domain.clone(), self.session.started_at_ms)
        else {
            return;
        };

        let now = self.clock.now_ms();
        let elapsed = now - started_at_ms;
        tracing::trace!(%domain, elapsed_ms = elapsed, "heartbeat");
        self.emit(domain, elapsed, started_at_ms);
        self.session.started_at_ms = Some(now);
    }
}
