//! Outer controller tying the timer engine to the tick source, the host's
//! commands, the identity subscription and the persistence adapter.
//!
//! All state changes go through one `select!` loop, so the engine is never
//! mutated concurrently. Store calls run in spawned tasks and never hold up
//! the next tick.

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::events::Event;
use crate::identity::{IdentityGate, UserId};
use crate::persistence::{
    await_writes, CalendarClock, LocalCalendar, SessionPersistence, WRITE_FLUSH_TIMEOUT,
};
use crate::timer::{parse_minutes, SessionLog, TimerEngine};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// User-facing controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    /// Start when idle, pause when running.
    Toggle,
    ResetToFocus,
    SkipToRest,
    SetFocusMinutes(u32),
    SetRestMinutes(u32),
    /// Emit a snapshot without changing anything.
    Snapshot,
    Shutdown,
}

impl Command {
    /// Parse one line of user input.
    ///
    /// Unknown words and non-numeric minute values yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let cmd = match words.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("toggle") | Some("t") => Command::Toggle,
            Some("start") => Command::Start,
            Some("pause") | Some("p") => Command::Pause,
            Some("focus") | Some("reset") | Some("f") => Command::ResetToFocus,
            Some("break") | Some("rest") | Some("b") => Command::SkipToRest,
            Some("focus-min") => Command::SetFocusMinutes(parse_minutes(words.next()?)?),
            Some("rest-min") | Some("break-min") => {
                Command::SetRestMinutes(parse_minutes(words.next()?)?)
            }
            Some("status") | Some("s") => Command::Snapshot,
            Some("quit") | Some("exit") | Some("q") => Command::Shutdown,
            Some(_) => return None,
        };
        Some(cmd)
    }
}

/// Result of the one session-log load.
#[derive(Debug)]
pub struct LoadOutcome {
    pub user: UserId,
    pub date: NaiveDate,
    pub log: Option<SessionLog>,
}

pub struct PomodoroController {
    engine: TimerEngine,
    persistence: SessionPersistence,
    clock: Arc<dyn CalendarClock>,
    identity: Option<UserId>,
    gate: IdentityGate,
    loads_tx: mpsc::Sender<LoadOutcome>,
    loads_rx: mpsc::Receiver<LoadOutcome>,
    writes: Vec<JoinHandle<()>>,
}

impl PomodoroController {
    pub fn new(engine: TimerEngine, persistence: SessionPersistence) -> Self {
        let (loads_tx, loads_rx) = mpsc::channel(1);
        Self {
            engine,
            persistence,
            clock: Arc::new(LocalCalendar),
            identity: None,
            gate: IdentityGate::new(),
            loads_tx,
            loads_rx,
            writes: Vec::new(),
        }
    }

    /// Replace the date source used for document keys.
    pub fn with_clock(mut self, clock: Arc<dyn CalendarClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn identity(&self) -> Option<&UserId> {
        self.identity.as_ref()
    }

    /// Writes spawned and not yet finished.
    pub fn pending_writes(&self) -> usize {
        self.writes.iter().filter(|h| !h.is_finished()).count()
    }

    pub fn handle(&mut self, command: Command) -> Option<Event> {
        match command {
            Command::Start => self.engine.start(),
            Command::Pause => self.engine.pause(),
            Command::Toggle => self.engine.toggle(),
            Command::ResetToFocus => self.engine.reset_to_focus(),
            Command::SkipToRest => self.engine.skip_to_rest(),
            Command::SetFocusMinutes(m) => self.engine.set_focus_minutes(m),
            Command::SetRestMinutes(m) => self.engine.set_rest_minutes(m),
            Command::Snapshot | Command::Shutdown => None,
        }
    }

    /// Advance one second. A completed focus interval triggers the write.
    pub fn tick(&mut self) -> Option<Event> {
        let event = self.engine.tick();
        if let Some(Event::FocusCompleted { .. }) = event {
            self.persist_log();
        }
        event
    }

    /// Feed the latest identity report from the host.
    ///
    /// Later writes use whichever identity was reported last. The first
    /// signed-in report also starts the one session-log load.
    pub fn observe_identity(&mut self, identity: Option<UserId>) {
        if self.identity != identity {
            info!(
                user = identity.as_ref().map(UserId::as_str).unwrap_or("<signed out>"),
                "identity changed"
            );
        }
        self.identity = identity.clone();

        if let Some(user) = self.gate.observe(identity) {
            let date = self.clock.today();
            let persistence = self.persistence.clone();
            let tx = self.loads_tx.clone();
            tokio::spawn(async move {
                let log = persistence.load_session_log(&user, date).await;
                let _ = tx.send(LoadOutcome { user, date, log }).await;
            });
        }
    }

    /// Wait for the load started by `observe_identity` to finish.
    pub async fn next_load(&mut self) -> Option<LoadOutcome> {
        self.loads_rx.recv().await
    }

    /// Apply a finished load. An absent record leaves the log as it is.
    pub fn apply_loaded(&mut self, outcome: LoadOutcome) -> Option<Event> {
        match outcome.log {
            Some(log) => self.engine.restore_log(log),
            None => {
                debug!(user = %outcome.user, date = %outcome.date, "nothing to restore");
                None
            }
        }
    }

    /// Wait for spawned writes to finish, abandoning any still running
    /// after [`WRITE_FLUSH_TIMEOUT`]. Returns how many were abandoned.
    pub async fn flush_writes(&mut self) -> usize {
        let handles: Vec<_> = self.writes.drain(..).collect();
        await_writes(handles, WRITE_FLUSH_TIMEOUT).await
    }

    fn persist_log(&mut self) {
        let Some(user) = self.identity.as_ref() else {
            debug!("signed out; session log kept local");
            return;
        };
        let date = self.clock.today();
        let handle = self
            .persistence
            .record_completed_session(user, date, self.engine.session_log());
        self.writes.retain(|h| !h.is_finished());
        self.writes.push(handle);
    }

    /// Drive the timer until `Shutdown` arrives or the command channel
    /// closes, then wait (bounded) for outstanding writes and hand back the
    /// engine.
    ///
    /// Every change is followed by a `StateSnapshot` on `events`.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut identity: watch::Receiver<Option<UserId>>,
        events: mpsc::UnboundedSender<Event>,
    ) -> TimerEngine {
        let mut ticker = time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        let initial = identity.borrow_and_update().clone();
        self.observe_identity(initial);
        let mut identity_open = true;
        let _ = events.send(self.engine.snapshot());

        loop {
            let event = tokio::select! {
                _ = ticker.tick() => {
                    if !self.engine.is_running() {
                        continue;
                    }
                    self.tick()
                }
                command = commands.recv() => match command {
                    None | Some(Command::Shutdown) => break,
                    Some(command) => {
                        let was_running = self.engine.is_running();
                        let event = self.handle(command);
                        if !was_running && self.engine.is_running() {
                            // First decrement lands one full second after start.
                            ticker.reset();
                        }
                        event
                    }
                },
                changed = identity.changed(), if identity_open => {
                    match changed {
                        Ok(()) => {
                            let current = identity.borrow_and_update().clone();
                            self.observe_identity(current);
                        }
                        Err(_) => identity_open = false,
                    }
                    None
                }
                Some(outcome) = self.loads_rx.recv() => self.apply_loaded(outcome),
            };

            if let Some(event) = event {
                let _ = events.send(event);
            }
            let _ = events.send(self.engine.snapshot());
        }

        self.flush_writes().await;
        self.engine
    }
}
