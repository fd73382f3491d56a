use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use pomotally_core::{
    await_writes, Config, Database, Event, SessionLog, SessionPersistence, TimerEngine,
    WRITE_FLUSH_TIMEOUT,
};

use super::runtime;

const STATE_KEY: &str = "timer_state";
/// Longest gap between invocations that is replayed as ticks.
const MAX_CATCH_UP_SECS: i64 = 24 * 60 * 60;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Start when paused, pause when running
    Toggle,
    /// Back to the start of a focus interval (stays paused)
    Focus,
    /// Jump to the start of a rest interval (stays paused)
    Break,
    /// Change the focus length in minutes
    SetFocus { minutes: String },
    /// Change the rest length in minutes
    SetRest { minutes: String },
    /// Print current timer state as JSON
    Status,
}

/// Timer state carried between invocations.
#[derive(Serialize, Deserialize)]
struct SavedTimer {
    engine: TimerEngine,
    saved_at: DateTime<Utc>,
    log_date: NaiveDate,
    /// The one session-log load for `log_date` has been issued.
    #[serde(default)]
    restored: bool,
}

impl SavedTimer {
    fn fresh(config: &Config, now: DateTime<Utc>, today: NaiveDate) -> Self {
        Self {
            engine: TimerEngine::new(config.durations()),
            saved_at: now,
            log_date: today,
            restored: false,
        }
    }
}

/// Ticks replayed within one local calendar date.
struct DayReplay {
    date: NaiveDate,
    events: Vec<Event>,
    /// The date's log after the replay.
    log: SessionLog,
}

impl DayReplay {
    fn completed_focus(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, Event::FocusCompleted { .. }))
    }
}

/// Fetches the stored log for a date. Absent when signed out.
type LogLoader<'a> = Option<&'a mut dyn FnMut(NaiveDate) -> Option<SessionLog>>;

fn load_saved(db: &Database, config: &Config, now: DateTime<Utc>, today: NaiveDate) -> SavedTimer {
    if let Ok(Some(json)) = db.kv_get(STATE_KEY) {
        match serde_json::from_str::<SavedTimer>(&json) {
            Ok(saved) => return saved,
            Err(e) => tracing::warn!(error = %e, "discarding unreadable timer state"),
        }
    }
    SavedTimer::fresh(config, now, today)
}

fn save(db: &Database, saved: &SavedTimer) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(saved)?;
    db.kv_set(STATE_KEY, &json)?;
    Ok(())
}

fn local_date<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// First instant of the day after `date` in `tz`. Falls back to 01:00 when
/// midnight does not exist there.
fn next_day_start<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    let next = date.succ_opt()?;
    [0, 1].into_iter().find_map(|hour| {
        let local = next.and_hms_opt(hour, 0, 0)?;
        tz.from_local_datetime(&local)
            .earliest()
            .map(|at| at.with_timezone(&Utc))
    })
}

/// Switch the engine's log to `date`, loading that date's stored log once.
fn enter_date(saved: &mut SavedTimer, date: NaiveDate, load: &mut LogLoader<'_>) {
    if saved.log_date != date {
        tracing::debug!(from = %saved.log_date, to = %date, "new calendar day; log starts empty");
        saved.engine.restore_log(SessionLog::new());
        saved.log_date = date;
        saved.restored = false;
    }
    if saved.restored {
        return;
    }
    if let Some(load) = load.as_deref_mut() {
        if let Some(log) = load(date) {
            saved.engine.restore_log(log);
        }
        saved.restored = true;
    }
}

/// Replay the wall-clock seconds since the last invocation as ticks.
///
/// The replay is split at local midnight so each completion lands in the log
/// of the date it happened on. Gaps longer than a day only replay the last
/// day.
fn catch_up<Tz: TimeZone>(
    saved: &mut SavedTimer,
    now: DateTime<Utc>,
    tz: &Tz,
    mut load: LogLoader<'_>,
) -> Vec<DayReplay> {
    let running = saved.engine.is_running();
    let mut cursor = saved.saved_at;
    if !running || cursor >= now {
        cursor = now;
    } else if (now - cursor).num_seconds() > MAX_CATCH_UP_SECS {
        tracing::debug!(since = %cursor, "timer left running for over a day");
        cursor = now - Duration::seconds(MAX_CATCH_UP_SECS);
    }

    let mut replays = Vec::new();
    loop {
        let date = local_date(cursor, tz);
        enter_date(saved, date, &mut load);

        let end = match next_day_start(tz, date) {
            Some(midnight) if midnight < now => midnight,
            _ => now,
        };
        let secs = (end - cursor).num_seconds().max(0);
        let events = saved.engine.advance_by(secs as u64);
        if !events.is_empty() {
            replays.push(DayReplay {
                date,
                events,
                log: saved.engine.session_log().clone(),
            });
        }

        if end == now {
            // Keep the sub-second remainder for the next invocation.
            cursor += Duration::seconds(secs);
            break;
        }
        cursor = end;
    }
    saved.saved_at = cursor;
    replays
}

fn apply(engine: &mut TimerEngine, action: TimerAction) -> Option<Event> {
    match action {
        TimerAction::Start => engine.start(),
        TimerAction::Pause => engine.pause(),
        TimerAction::Toggle => engine.toggle(),
        TimerAction::Focus => engine.reset_to_focus(),
        TimerAction::Break => engine.skip_to_rest(),
        TimerAction::SetFocus { minutes } => match pomotally_core::timer::parse_minutes(&minutes) {
            Some(m) => engine.set_focus_minutes(m),
            None => {
                tracing::debug!(input = %minutes, "ignored non-numeric focus length");
                None
            }
        },
        TimerAction::SetRest { minutes } => match pomotally_core::timer::parse_minutes(&minutes) {
            Some(m) => engine.set_rest_minutes(m),
            None => {
                tracing::debug!(input = %minutes, "ignored non-numeric rest length");
                None
            }
        },
        TimerAction::Status => None,
    }
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let now = Utc::now();
    let mut saved = load_saved(&db, &config, now, local_date(now, &Local));

    let user = config.user();
    let rt = runtime()?;
    let store = pomotally_core::open_store(&config)?;
    let persistence = SessionPersistence::new(store);

    let replays = match user.as_ref() {
        Some(user) => {
            let mut load = |date: NaiveDate| rt.block_on(persistence.load_session_log(user, date));
            catch_up(&mut saved, now, &Local, Some(&mut load))
        }
        None => catch_up(&mut saved, now, &Local, None),
    };

    let mut writes: Vec<JoinHandle<()>> = Vec::new();
    for day in replays.iter().filter(|day| day.completed_focus()) {
        match user.as_ref() {
            Some(user) => {
                let _guard = rt.enter();
                writes.push(persistence.record_completed_session(user, day.date, &day.log));
            }
            None => tracing::debug!(date = %day.date, "signed out; session log kept local"),
        }
    }

    let mut events: Vec<Event> = replays.into_iter().flat_map(|day| day.events).collect();
    events.extend(apply(&mut saved.engine, action));

    for event in &events {
        println!("{}", serde_json::to_string_pretty(event)?);
    }
    println!("{}", serde_json::to_string_pretty(&saved.engine.snapshot())?);

    rt.block_on(await_writes(writes, WRITE_FLUSH_TIMEOUT));
    rt.shutdown_background();

    save(&db, &saved)?;
    Ok(())
}
