//! Core domain logic for dwell.
//!
//! This crate contains the fundamental types and logic for:
//! - Tracking: the state machine attributing wall-clock time to the focused domain
//! - Heartbeat: periodic flushing of the open accrual
//! - Domains: hostname extraction and normalization
//! - Storage contract: the date/domain duration accumulator

pub mod clock;
pub mod domain;
mod heartbeat;
pub mod sink;
pub mod store;
pub mod tracker;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use domain::Domain;
pub use heartbeat::DEFAULT_HEARTBEAT_INTERVAL;
pub use sink::{Flush, FlushSink, RecordingSink, StoreSink};
pub use store::{
    DailyTotals, DateZone, DurationStore, MemoryStore, StoreError, date_key, format_date_key,
};
pub use tracker::{ActivityProbe, Observation, ProbeError, Session, Tracker, TrackingState};
pub use types::{IdleState, TabRef, ValidationError, WindowRef};
