mod clock_face;
mod durations;
mod engine;
mod session_log;

pub use clock_face::format_clock;
pub use durations::{
    clamp_minutes, parse_minutes, Durations, Phase, DEFAULT_FOCUS_MINUTES,
    DEFAULT_REST_MINUTES, MAX_DURATION_MINUTES, MIN_DURATION_MINUTES,
};
pub use engine::{TimerEngine, TimerState};
pub use session_log::SessionLog;
