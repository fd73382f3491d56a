//! Timer engine implementation.
//!
//! The timer engine is a tick-driven state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()` once per
//! second while the timer runs.
//!
//! ## State Transitions
//!
//! ```text
//! Idle <-> Running-Focus -> Running-Rest -> Running-Focus -> ...
//!            (start/pause)   (tick hits zero)
//! ```
//!
//! `reset_to_focus` and `skip_to_rest` may be called from any state and
//! always leave the timer idle.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(Durations::default());
//! engine.start();
//! // Once per second:
//! if let Some(Event::FocusCompleted { .. }) = engine.tick() {
//!     // persist engine.session_log()
//! }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::clock_face::format_clock;
use super::durations::{Durations, Phase};
use super::session_log::SessionLog;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
}

/// Core timer engine.
///
/// Owns the countdown, the current phase and the session log for the day.
/// Invariant: `remaining_secs <= durations.longest_secs()`. Saved state is
/// brought back within bounds when it is deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoredEngine")]
pub struct TimerEngine {
    durations: Durations,
    phase: Phase,
    running: bool,
    remaining_secs: u64,
    #[serde(default)]
    log: SessionLog,
}

#[derive(Deserialize)]
struct StoredEngine {
    durations: Durations,
    phase: Phase,
    running: bool,
    remaining_secs: u64,
    #[serde(default)]
    log: SessionLog,
}

impl From<StoredEngine> for TimerEngine {
    fn from(stored: StoredEngine) -> Self {
        let longest = stored.durations.longest_secs();
        let remaining_secs = match stored.remaining_secs {
            0 => stored.durations.secs_for(stored.phase),
            secs => secs.min(longest),
        };
        Self {
            durations: stored.durations,
            phase: stored.phase,
            running: stored.running,
            remaining_secs,
            log: stored.log,
        }
    }
}

impl TimerEngine {
    /// Create a new engine, idle at the start of a focus interval.
    pub fn new(durations: Durations) -> Self {
        Self {
            remaining_secs: durations.focus_secs(),
            durations,
            phase: Phase::Focus,
            running: false,
            log: SessionLog::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        if self.running {
            TimerState::Running
        } else {
            TimerState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn durations(&self) -> Durations {
        self.durations
    }

    pub fn session_log(&self) -> &SessionLog {
        &self.log
    }

    pub fn completed_sessions(&self) -> usize {
        self.log.count()
    }

    /// Current countdown as `mm:ss`.
    pub fn clock(&self) -> String {
        format_clock(self.remaining_secs)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            running: self.running,
            remaining_secs: self.remaining_secs,
            clock: self.clock(),
            completed_sessions: self.log.count(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.running {
            return None;
        }
        self.running = true;
        Some(Event::TimerStarted {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.running = false;
        Some(Event::TimerPaused {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Start/Pause button.
    pub fn toggle(&mut self) -> Option<Event> {
        if self.running {
            self.pause()
        } else {
            self.start()
        }
    }

    pub fn reset_to_focus(&mut self) -> Option<Event> {
        self.running = false;
        self.phase = Phase::Focus;
        self.remaining_secs = self.durations.focus_secs();
        Some(Event::ResetToFocus {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn skip_to_rest(&mut self) -> Option<Event> {
        self.running = false;
        self.phase = Phase::Rest;
        self.remaining_secs = self.durations.rest_secs();
        Some(Event::SkippedToRest {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Change the focus length. Input is clamped to the accepted range.
    pub fn set_focus_minutes(&mut self, minutes: u32) -> Option<Event> {
        self.durations.set_focus_min(minutes);
        self.apply_duration_change(Phase::Focus)
    }

    /// Change the rest length. Input is clamped to the accepted range.
    pub fn set_rest_minutes(&mut self, minutes: u32) -> Option<Event> {
        self.durations.set_rest_min(minutes);
        self.apply_duration_change(Phase::Rest)
    }

    /// Replace the session log, e.g. with the record loaded on sign-in.
    pub fn restore_log(&mut self, log: SessionLog) -> Option<Event> {
        self.log = log;
        info!(completed = self.log.count(), "session log restored");
        Some(Event::SessionLogRestored {
            completed_sessions: self.log.count(),
            at: Utc::now(),
        })
    }

    /// Call once per second. Ticks while idle are ignored.
    ///
    /// Returns `Some(Event::FocusCompleted)` or `Some(Event::RestCompleted)`
    /// when the countdown crosses zero.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }

        match self.phase {
            Phase::Focus => {
                let duration_secs = self.durations.focus_secs();
                self.log.push(duration_secs);
                self.phase = Phase::Rest;
                self.remaining_secs = self.durations.rest_secs();
                info!(
                    duration_secs,
                    completed = self.log.count(),
                    "focus interval completed"
                );
                Some(Event::FocusCompleted {
                    duration_secs,
                    completed_sessions: self.log.count(),
                    at: Utc::now(),
                })
            }
            Phase::Rest => {
                self.phase = Phase::Focus;
                self.remaining_secs = self.durations.focus_secs();
                info!("rest interval completed");
                Some(Event::RestCompleted { at: Utc::now() })
            }
        }
    }

    /// Replay `secs` ticks at once, collecting the phase-boundary events.
    pub fn advance_by(&mut self, secs: u64) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..secs {
            if !self.running {
                break;
            }
            if let Some(event) = self.tick() {
                events.push(event);
            }
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Idle with the changed phase showing: the countdown follows the new
    /// length. Otherwise the countdown is only clamped so it never exceeds
    /// the longest configured phase.
    fn apply_duration_change(&mut self, changed: Phase) -> Option<Event> {
        if !self.running && self.phase == changed {
            self.remaining_secs = self.durations.secs_for(changed);
        } else {
            self.remaining_secs = self.remaining_secs.min(self.durations.longest_secs());
        }
        debug!(
            focus_min = self.durations.focus_min(),
            rest_min = self.durations.rest_min(),
            remaining_secs = self.remaining_secs,
            "durations changed"
        );
        Some(Event::DurationsChanged {
            focus_minutes: self.durations.focus_min(),
            rest_minutes: self.durations.rest_min(),
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(Durations::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_at(phase: Phase, remaining: u64) -> TimerEngine {
        let mut engine = TimerEngine::default();
        if phase == Phase::Rest {
            engine.skip_to_rest();
        }
        engine.remaining_secs = remaining;
        engine.start();
        engine
    }

    #[test]
    fn new_engine_is_idle_focus() {
        let engine = TimerEngine::default();
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.phase(), Phase::Focus);
        assert_eq!(engine.remaining_secs(), 1500);
        assert_eq!(engine.clock(), "25:00");
    }

    #[test]
    fn start_is_noop_when_running() {
        let mut engine = TimerEngine::default();
        assert!(engine.start().is_some());
        assert!(engine.start().is_none());
        assert_eq!(engine.state(), TimerState::Running);
    }

    #[test]
    fn pause_is_noop_when_idle() {
        let mut engine = TimerEngine::default();
        assert!(engine.pause().is_none());
    }

    #[test]
    fn pause_then_start_preserves_countdown() {
        let mut engine = TimerEngine::default();
        engine.start();
        engine.advance_by(42);
        let (remaining, phase) = (engine.remaining_secs(), engine.phase());

        engine.pause();
        engine.start();
        assert_eq!(engine.remaining_secs(), remaining);
        assert_eq!(engine.phase(), phase);
    }

    #[test]
    fn tick_ignored_while_idle() {
        let mut engine = TimerEngine::default();
        assert!(engine.tick().is_none());
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn focus_end_appends_and_switches_to_rest() {
        let mut engine = running_at(Phase::Focus, 1);
        let event = engine.tick();
        assert!(matches!(
            event,
            Some(Event::FocusCompleted {
                duration_secs: 1500,
                completed_sessions: 1,
                ..
            })
        ));
        assert_eq!(engine.phase(), Phase::Rest);
        assert_eq!(engine.remaining_secs(), 300);
        assert!(engine.is_running());
        assert_eq!(engine.session_log().entries(), &[1500]);
    }

    #[test]
    fn rest_end_switches_to_focus_without_append() {
        let mut engine = running_at(Phase::Rest, 1);
        let event = engine.tick();
        assert!(matches!(event, Some(Event::RestCompleted { .. })));
        assert_eq!(engine.phase(), Phase::Focus);
        assert_eq!(engine.remaining_secs(), 1500);
        assert!(engine.is_running());
        assert!(engine.session_log().is_empty());
    }

    #[test]
    fn full_focus_interval_takes_exactly_its_length() {
        let mut engine = TimerEngine::default();
        engine.start();
        let events = engine.advance_by(1500);
        let completions = events
            .iter()
            .filter(|e| matches!(e, Event::FocusCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
        assert_eq!(engine.phase(), Phase::Rest);
        assert_eq!(engine.remaining_secs(), 300);
        assert_eq!(engine.completed_sessions(), 1);
    }

    #[test]
    fn reset_and_skip_leave_timer_idle() {
        let mut engine = TimerEngine::default();
        engine.start();
        engine.skip_to_rest();
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.phase(), Phase::Rest);
        assert_eq!(engine.remaining_secs(), 300);

        engine.start();
        engine.reset_to_focus();
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.phase(), Phase::Focus);
        assert_eq!(engine.remaining_secs(), 1500);
    }

    #[test]
    fn idle_duration_change_resizes_current_phase() {
        let mut engine = TimerEngine::default();
        engine.set_focus_minutes(50);
        assert_eq!(engine.remaining_secs(), 3000);

        // Rest is not showing, so the countdown stays put.
        engine.set_rest_minutes(10);
        assert_eq!(engine.remaining_secs(), 3000);
    }

    #[test]
    fn running_duration_change_only_clamps() {
        let mut engine = TimerEngine::default();
        engine.start();
        engine.advance_by(100);
        engine.set_focus_minutes(50);
        assert_eq!(engine.remaining_secs(), 1400);

        engine.set_focus_minutes(10);
        assert_eq!(engine.remaining_secs(), 600);
    }

    #[test]
    fn zero_minutes_are_clamped() {
        let mut engine = TimerEngine::default();
        engine.set_focus_minutes(0);
        assert_eq!(engine.durations().focus_min(), 1);
        assert_eq!(engine.remaining_secs(), 60);
    }

    #[test]
    fn restore_replaces_log() {
        let mut engine = TimerEngine::default();
        engine.restore_log(SessionLog::from(vec![1500, 1500]));
        assert_eq!(engine.completed_sessions(), 2);
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let engine = TimerEngine::default();
        match engine.snapshot() {
            Event::StateSnapshot {
                phase,
                running,
                remaining_secs,
                clock,
                completed_sessions,
                ..
            } => {
                assert_eq!(phase, Phase::Focus);
                assert!(!running);
                assert_eq!(remaining_secs, 1500);
                assert_eq!(clock, "25:00");
                assert_eq!(completed_sessions, 0);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }

    #[test]
    fn corrupt_saved_state_is_brought_back_in_bounds() {
        let saved = r#"{
            "durations": {"focus_min": 0, "rest_min": 2},
            "phase": "rest",
            "running": true,
            "remaining_secs": 99999,
            "log": [1500]
        }"#;
        let mut engine: TimerEngine = serde_json::from_str(saved).unwrap();
        assert_eq!(engine.durations().focus_secs(), 60);
        assert_eq!(engine.remaining_secs(), 120);

        // Runs out the rest, then a whole one-minute focus before logging.
        assert_eq!(engine.advance_by(120).len(), 1);
        assert_eq!(engine.completed_sessions(), 1);
        engine.advance_by(60);
        assert_eq!(engine.session_log().entries(), &[1500, 60]);
    }

    #[test]
    fn zero_countdown_restarts_current_phase() {
        let saved = r#"{"durations":{"focus_min":25,"rest_min":5},
            "phase":"focus","running":false,"remaining_secs":0}"#;
        let engine: TimerEngine = serde_json::from_str(saved).unwrap();
        assert_eq!(engine.remaining_secs(), 1500);
        assert!(engine.session_log().is_empty());
    }
}
