use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every state change in the timer produces an Event.
/// Hosts render snapshots; the controller reacts to `FocusCompleted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A focus interval ran to zero and was appended to the session log.
    FocusCompleted {
        duration_secs: u64,
        completed_sessions: usize,
        at: DateTime<Utc>,
    },
    /// A rest interval ran to zero; the next focus interval begins.
    RestCompleted {
        at: DateTime<Utc>,
    },
    ResetToFocus {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SkippedToRest {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    DurationsChanged {
        focus_minutes: u32,
        rest_minutes: u32,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The session log was replaced by the persisted record.
    SessionLogRestored {
        completed_sessions: usize,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        running: bool,
        remaining_secs: u64,
        clock: String,
        completed_sessions: usize,
        at: DateTime<Utc>,
    },
}
