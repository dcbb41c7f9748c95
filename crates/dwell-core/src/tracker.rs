//! The tracking state machine.
//!
//! The [`Tracker`] owns the single [`Session`] and decides, from focus, navigation
//! and idle signals, which domain is accruing time. Every transition boundary
//! flushes the elapsed time of the accrual it closes to a [`FlushSink`].
//!
//! # States
//!
//! States are derived from the session fields, never stored:
//! - `Empty`: no domain, not idle
//! - `Suspended`: the user is away
//! - `Tracking(domain)`: domain present, not idle, accrual open
//!
//! # Invariants
//!
//! - `started_at` is present iff a domain is accruing (domain present, not idle).
//! - At most one accrual is open at any instant.
//! - No accrual is ever opened while idle.
//!
//! Entry points take `&mut self`; callers on a multi-threaded host must serialize
//! them (the daemon runs the tracker on a single task).

use thiserror::Error;

use crate::clock::Clock;
use crate::domain::Domain;
use crate::sink::{Flush, FlushSink};
use crate::types::{IdleState, TabRef, WindowRef};

/// The current session. Created once, reset field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub(crate) domain: Option<Domain>,
    pub(crate) started_at_ms: Option<i64>,
    pub(crate) tab: Option<TabRef>,
    pub(crate) window: Option<WindowRef>,
    pub(crate) idle: bool,
}

impl Session {
    /// Domain currently attributed time.
    pub const fn domain(&self) -> Option<&Domain> {
        self.domain.as_ref()
    }

    /// Start of the open accrual period.
    pub const fn started_at_ms(&self) -> Option<i64> {
        self.started_at_ms
    }

    /// Tab associated with the domain.
    pub const fn tab(&self) -> Option<&TabRef> {
        self.tab.as_ref()
    }

    /// Window associated with the domain.
    pub const fn window(&self) -> Option<&WindowRef> {
        self.window.as_ref()
    }

    /// Whether the user is believed to be away.
    pub const fn is_idle(&self) -> bool {
        self.idle
    }

    /// Whether an accrual is open.
    pub const fn is_tracking(&self) -> bool {
        !self.idle && self.domain.is_some() && self.started_at_ms.is_some()
    }
}

/// State derived from the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState<'a> {
    /// Nothing trackable is focused.
    Empty,
    /// The user is away.
    Suspended,
    /// Time is accruing for a domain.
    Tracking(&'a Domain),
}

/// A snapshot of what the user is looking at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    /// Normalized domain of the active tab, if any.
    pub domain: Option<Domain>,
    pub tab: Option<TabRef>,
    pub window: Option<WindowRef>,
    /// System idle state at observation time.
    pub idle_state: IdleState,
}

impl Observation {
    /// Builds an observation from the active tab's URL.
    ///
    /// Unparsable or hostless URLs yield an observation without a domain.
    pub fn from_url(
        url: Option<&str>,
        tab: Option<TabRef>,
        window: Option<WindowRef>,
        idle_state: IdleState,
    ) -> Self {
        Self {
            domain: url.and_then(Domain::from_url),
            tab,
            window,
            idle_state,
        }
    }
}

/// Failure to query the live tab/window/idle state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("failed to query current activity: {0}")]
    Query(String),
}

/// Live query of the current tab, window and idle state.
pub trait ActivityProbe {
    fn current(&mut self) -> Result<Observation, ProbeError>;
}

/// The tracking state machine.
#[derive(Debug)]
pub struct Tracker<C, S> {
    pub(crate) clock: C,
    pub(crate) sink: S,
    pub(crate) session: Session,
}

impl<C: Clock, S: FlushSink> Tracker<C, S> {
    /// Creates a tracker with an empty session.
    pub fn new(clock: C, sink: S) -> Self {
        Self {
            clock,
            sink,
            session: Session::default(),
        }
    }

    /// Returns the session.
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the derived state.
    pub fn state(&self) -> TrackingState<'_> {
        if self.session.idle {
            return TrackingState::Suspended;
        }
        match (&self.session.domain, self.session.started_at_ms) {
            (Some(domain), Some(_)) => TrackingState::Tracking(domain),
            _ => TrackingState::Empty,
        }
    }

    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub const fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Handles a change of active tab, window or URL.
    pub fn on_domain_observed(&mut self, observation: Observation) {
        let Observation {
            domain,
            tab,
            window,
            idle_state,
        } = observation;

        if idle_state.is_away() {
            if !self.session.idle {
                tracing::debug!(%idle_state, "observation while away, suspending");
                self.mark_idle();
            }
            return;
        }

        let Some(domain) = domain else {
            self.suspend();
            return;
        };

        if self.session.is_tracking() && self.session.domain.as_ref() == Some(&domain) {
            self.session.tab = tab;
            self.session.window = window;
            return;
        }

        self.suspend();
        self.open(domain, tab, window);
    }

    /// Closes the open accrual, if any, flushing its elapsed time.
    ///
    /// Always clears the domain, start time and tab/window references, even when
    /// only some of them were set. The idle flag is left untouched.
    pub fn suspend(&mut self) {
        let domain = self.session.domain.take();
        let started_at_ms = self.session.started_at_ms.take();
        self.session.tab = None;
        self.session.window = None;

        match (domain, started_at_ms) {
            (Some(domain), Some(started_at_ms)) => {
                let elapsed = self.clock.now_ms() - started_at_ms;
                tracing::debug!(%domain, elapsed_ms = elapsed, "closing accrual");
                self.emit(domain, elapsed, started_at_ms);
            }
            (None, None) => {}
            (domain, started_at_ms) => {
                tracing::warn!(?domain, ?started_at_ms, "reset inconsistent session");
            }
        }
    }

    /// All browser windows lost focus.
    pub fn on_focus_lost(&mut self) {
        self.suspend();
    }

    /// Handles a system idle state change.
    ///
    /// Returning to `Active` clears the idle flag and re-syncs from the probe.
    pub fn on_idle_changed<P: ActivityProbe + ?Sized>(
        &mut self,
        new_state: IdleState,
        probe: &mut P,
    ) {
        if new_state.is_away() {
            if !self.session.idle {
                tracing::debug!(%new_state, "user away, suspending");
                self.mark_idle();
            }
            return;
        }
        self.session.idle = false;
        self.resync(probe);
    }

    /// Re-derives the session from live state (startup, reinitialization).
    pub fn resync<P: ActivityProbe + ?Sized>(&mut self, probe: &mut P) {
        match probe.current() {
            Ok(observation) => self.on_domain_observed(observation),
            Err(err) => tracing::warn!(error = %err, "activity re-sync skipped"),
        }
    }

    fn mark_idle(&mut self) {
        self.suspend();
        self.session.idle = true;
    }

    fn open(&mut self, domain: Domain, tab: Option<TabRef>, window: Option<WindowRef>) {
        let now = self.clock.now_ms();
        tracing::debug!(%domain, started_at_ms = now, "opening accrual");
        self.session = Session {
            domain: Some(domain),
            started_at_ms: Some(now),
            tab,
            window,
            idle: false,
        };
    }

    pub(crate) fn emit(&mut self, domain: Domain, elapsed_ms: i64, started_at_ms: i64) {
        if elapsed_ms <= 0 {
            return;
        }
        self.sink.deliver(Flush {
            domain,
            delta_ms: elapsed_ms,
            started_at_ms,
        });
    }
}
