//! Host events consumed by the tracking daemon.
//!
//! The browser-side event source writes one JSON object per line:
//!
//! ```text
//! {"type":"domain_observed","url":"https://www.example.com/a","tab":"12","window":"3","idle_state":"active"}
//! {"type":"idle_changed","state":"locked"}
//! {"type":"focus_lost"}
//! {"type":"started"}
//! {"type":"reinitialized"}
//! ```
//!
//! Tab and window references are opaque strings. Missing `url`, `tab` and
//! `window` fields mean absent. A missing `idle_state` keeps the last idle state
//! the source reported, so navigation in a background tab cannot end an idle
//! period on its own.

use serde::{Deserialize, Serialize};

use dwell_core::{
    ActivityProbe, Clock, FlushSink, IdleState, Observation, ProbeError, TabRef, Tracker,
    WindowRef,
};

/// A signal from the browser event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// Active tab, window or URL changed.
    DomainObserved {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        tab: Option<TabRef>,
        #[serde(default)]
        window: Option<WindowRef>,
        #[serde(default)]
        idle_state: Option<IdleState>,
    },
    /// System idle state changed.
    IdleChanged { state: IdleState },
    /// No browser window has focus.
    FocusLost,
    /// Browser process started.
    Started,
    /// Extension installed or reloaded.
    Reinitialized,
}

impl HostEvent {
    /// Parses one line of the event stream.
    pub fn parse(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    /// Feeds the event to the tracker, keeping `snapshot` current.
    pub fn dispatch<C: Clock, S: FlushSink>(
        self,
        tracker: &mut Tracker<C, S>,
        snapshot: &mut LatestSnapshot,
    ) {
        match self {
            Self::DomainObserved {
                url,
                tab,
                window,
                idle_state,
            } => {
                let idle_state = idle_state.unwrap_or(snapshot.observation.idle_state);
                let observation = Observation::from_url(url.as_deref(), tab, window, idle_state);
                snapshot.observation = observation.clone();
                tracker.on_domain_observed(observation);
            }
            Self::IdleChanged { state } => {
                snapshot.observation.idle_state = state;
                tracker.on_idle_changed(state, snapshot);
            }
            Self::FocusLost => {
                snapshot.observation = Observation {
                    idle_state: snapshot.observation.idle_state,
                    ..Observation::default()
                };
                tracker.on_focus_lost();
            }
            Self::Started | Self::Reinitialized => tracker.resync(snapshot),
        }
    }
}

/// The most recent tab/window/idle state reported by the event source.
///
/// Serves as the live query when the tracker needs to re-sync.
#[derive(Debug, Clone, Default)]
pub struct LatestSnapshot {
    observation: Observation,
}

impl ActivityProbe for LatestSnapshot {
    fn current(&mut self) -> Result<Observation, ProbeError> {
        Ok(self.observation.clone())
    }
}
