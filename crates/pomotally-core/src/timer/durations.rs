use serde::{Deserialize, Serialize};

/// Shortest accepted phase length.
pub const MIN_DURATION_MINUTES: u32 = 1;
/// Longest accepted phase length (one day).
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

pub const DEFAULT_FOCUS_MINUTES: u32 = 25;
pub const DEFAULT_REST_MINUTES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Focus,
    Rest,
}

impl Phase {
    /// Label shown above the clock face.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Focus => "Focus Time",
            Phase::Rest => "Rest Time",
        }
    }
}

/// Configured focus and rest lengths.
///
/// Both values are stored in whole minutes and are always within
/// `MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES`, including after
/// deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredDurations")]
pub struct Durations {
    focus_min: u32,
    rest_min: u32,
}

#[derive(Deserialize)]
struct StoredDurations {
    focus_min: u32,
    rest_min: u32,
}

impl From<StoredDurations> for Durations {
    fn from(stored: StoredDurations) -> Self {
        Self::new(stored.focus_min, stored.rest_min)
    }
}

impl Durations {
    /// Build from minute values, clamping each into the accepted range.
    pub fn new(focus_min: u32, rest_min: u32) -> Self {
        Self {
            focus_min: clamp_minutes(focus_min),
            rest_min: clamp_minutes(rest_min),
        }
    }

    pub fn focus_min(&self) -> u32 {
        self.focus_min
    }

    pub fn rest_min(&self) -> u32 {
        self.rest_min
    }

    pub fn focus_secs(&self) -> u64 {
        u64::from(self.focus_min) * 60
    }

    pub fn rest_secs(&self) -> u64 {
        u64::from(self.rest_min) * 60
    }

    /// Seconds configured for `phase`.
    pub fn secs_for(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Focus => self.focus_secs(),
            Phase::Rest => self.rest_secs(),
        }
    }

    /// Upper bound on the countdown across both phases.
    pub fn longest_secs(&self) -> u64 {
        self.focus_secs().max(self.rest_secs())
    }

    pub(crate) fn set_focus_min(&mut self, minutes: u32) {
        self.focus_min = clamp_minutes(minutes);
    }

    pub(crate) fn set_rest_min(&mut self, minutes: u32) {
        self.rest_min = clamp_minutes(minutes);
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self::new(DEFAULT_FOCUS_MINUTES, DEFAULT_REST_MINUTES)
    }
}

/// Clamp a minute count into the accepted range.
pub fn clamp_minutes(minutes: u32) -> u32 {
    minutes.clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES)
}

/// Parse user-entered minutes.
///
/// Non-numeric input is rejected with `None`. Numeric input, including zero
/// and negative values, is clamped into the accepted range.
pub fn parse_minutes(input: &str) -> Option<u32> {
    let value: i64 = input.trim().parse().ok()?;
    let bounded = value.clamp(
        i64::from(MIN_DURATION_MINUTES),
        i64::from(MAX_DURATION_MINUTES),
    );
    u32::try_from(bounded).ok()
}
