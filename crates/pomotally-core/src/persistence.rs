//! Session persistence adapter.
//!
//! Writes are fire-and-forget: `record_completed_session` spawns the store
//! call and returns immediately. A failed write is logged at `warn` and
//! dropped. There is no retry and nothing is reported back to the timer, so
//! a lost write only loses telemetry. Reads degrade the same way: any error
//! is treated as "no record for today".

use chrono::{Local, NaiveDate};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::identity::UserId;
use crate::store::{DocumentKey, DocumentStore, SessionDocument};
use crate::timer::SessionLog;

/// Source of the calendar date used in document keys.
pub trait CalendarClock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Today in the viewer's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCalendar;

impl CalendarClock for LocalCalendar {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always the same date. Useful for replaying a day and in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedCalendar(pub NaiveDate);

impl CalendarClock for FixedCalendar {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Clone)]
pub struct SessionPersistence {
    store: Arc<dyn DocumentStore>,
}

impl SessionPersistence {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Overwrite the (user, date) record with `log` in a background task.
    ///
    /// The returned handle may be dropped; awaiting it only tells the caller
    /// the attempt has finished, never whether it succeeded.
    pub fn record_completed_session(
        &self,
        user: &UserId,
        date: NaiveDate,
        log: &SessionLog,
    ) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let key = DocumentKey::session_log(user, date);
        let doc = SessionDocument::from(log);
        tokio::spawn(async move {
            match store.set(&key, &doc).await {
                Ok(()) => debug!(
                    store = store.name(),
                    %key,
                    entries = doc.pomodoro_counter.len(),
                    "session log saved"
                ),
                Err(e) => warn!(store = store.name(), %key, error = %e, "session log write dropped"),
            }
        })
    }

    /// Fetch the (user, date) record. Missing records and read failures
    /// both come back as `None`.
    pub async fn load_session_log(&self, user: &UserId, date: NaiveDate) -> Option<SessionLog> {
        let key = DocumentKey::session_log(user, date);
        match self.store.get(&key).await {
            Ok(Some(doc)) => {
                info!(store = self.store.name(), %key, entries = doc.pomodoro_counter.len(), "session log loaded");
                Some(SessionLog::from(doc))
            }
            Ok(None) => {
                debug!(store = self.store.name(), %key, "no session log for today");
                None
            }
            Err(e) => {
                warn!(store = self.store.name(), %key, error = %e, "session log read failed; starting empty");
                None
            }
        }
    }
}

/// How long a host waits for outstanding writes when it shuts down.
pub const WRITE_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait for spawned writes, giving up on the stragglers once `limit` has
/// passed. Abandoned writes are detached, not cancelled. Returns how many
/// were abandoned.
pub async fn await_writes(handles: Vec<JoinHandle<()>>, limit: Duration) -> usize {
    let deadline = Instant::now() + limit;
    let mut abandoned = 0;
    for handle in handles {
        if time::timeout_at(deadline, handle).await.is_err() {
            abandoned += 1;
        }
    }
    if abandoned > 0 {
        warn!(
            abandoned,
            waited_ms = limit.as_millis() as u64,
            "session log writes still pending; abandoning them"
        );
    }
    abandoned
}
