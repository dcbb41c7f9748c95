//! Run command: the tracking daemon.
//!
//! One task owns the [`Tracker`] and is the only place entry points are called,
//! so event handling and heartbeats never interleave. Flushes leave that task
//! through an unbounded channel and are written by a blocking writer that owns
//! the [`Database`]; the tracker never waits on a write.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use dwell_core::{Clock, Flush, FlushSink, SystemClock, Tracker};
use dwell_db::Database;

use crate::event::{HostEvent, LatestSnapshot};

/// Queues flushes for the background writer.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Flush>,
}

impl ChannelSink {
    pub const fn new(tx: mpsc::UnboundedSender<Flush>) -> Self {
        Self { tx }
    }
}

impl FlushSink for ChannelSink {
    fn deliver(&mut self, flush: Flush) {
        if let Err(err) = self.tx.send(flush) {
            tracing::warn!(
                domain = %err.0.domain,
                delta_ms = err.0.delta_ms,
                "flush writer gone, dropping tracked time"
            );
        }
    }
}

/// Outcome of the flush writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub written: usize,
    pub failed: usize,
}

/// Applies queued flushes until every sender is dropped.
fn write_flushes(db: &Database, mut rx: mpsc::UnboundedReceiver<Flush>) -> WriteStats {
    let mut stats = WriteStats::default();
    while let Some(flush) = rx.blocking_recv() {
        match db.accumulate(flush.domain.as_str(), flush.delta_ms, flush.started_at_ms) {
            Ok(()) => stats.written += 1,
            Err(err) => {
                stats.failed += 1;
                tracing::warn!(
                    domain = %flush.domain,
                    delta_ms = flush.delta_ms,
                    error = %err,
                    "failed to persist tracked time"
                );
            }
        }
    }
    stats
}

fn handle_line<C: Clock, S: FlushSink>(
    tracker: &mut Tracker<C, S>,
    snapshot: &mut LatestSnapshot,
    line: &str,
) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match HostEvent::parse(line) {
        Ok(event) => {
            tracing::debug!(?event, "event");
            event.dispatch(tracker, snapshot);
        }
        Err(err) => tracing::warn!(error = %err, line, "skipping malformed event"),
    }
}

/// Tracks time from events on `input` until it closes or the process is interrupted.
///
/// The open accrual is flushed and the writer drained before returning. Returns the
/// database so callers can keep using it.
pub async fn run<R>(input: R, db: Database, heartbeat: Duration) -> Result<(Database, WriteStats)>
where
    R: AsyncBufRead + Unpin,
{
    run_with_clock(input, db, heartbeat, SystemClock).await
}

pub async fn run_with_clock<R, C>(
    input: R,
    db: Database,
    heartbeat: Duration,
    clock: C,
) -> Result<(Database, WriteStats)>
where
    R: AsyncBufRead + Unpin,
    C: Clock,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::task::spawn_blocking(move || {
        let stats = write_flushes(&db, rx);
        (db, stats)
    });

    let mut tracker = Tracker::new(clock, ChannelSink::new(tx));
    let mut snapshot = LatestSnapshot::default();
    let mut lines = input.lines();

    let mut ticker = tokio::time::interval_at(Instant::now() + heartbeat, heartbeat);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!(heartbeat_secs = heartbeat.as_secs(), "waiting for events");

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&mut tracker, &mut snapshot, &line),
                Ok(None) => {
                    tracing::info!("event stream closed");
                    break;
                }
                Err(err) => {
                    tracing::error!(error = %err, "failed to read event stream");
                    break;
                }
            },
            _ = ticker.tick() => tracker.on_heartbeat(),
            result = &mut shutdown => {
                if let Err(err) = result {
                    tracing::error!(error = %err, "failed to listen for interrupt");
                }
                tracing::info!("interrupted");
                break;
            }
        }
    }

    tracker.suspend();
    drop(tracker);

    let (db, stats) = writer.await.context("flush writer panicked")?;
    tracing::info!(written = stats.written, failed = stats.failed, "tracking stopped");
    Ok((db, stats))
}
