//! # pomotally Core Library
//!
//! Business logic for a Pomodoro focus/rest tracker that keeps a per-day
//! tally of completed focus intervals in a keyed document store. The
//! `pomotally` CLI is a thin front-end over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-driven state machine (focus → rest → focus);
//!   the caller invokes `tick()` once per second
//! - **Persistence**: a fire-and-forget adapter that writes the session log
//!   on every completed focus interval and loads it once on sign-in
//! - **Controller**: the select loop combining ticks, commands, identity
//!   reports and load results
//! - **Stores**: in-memory, SQLite and hosted (Firestore REST) backends
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`SessionPersistence`]: Session-log read/write contract
//! - [`PomodoroController`]: Host-facing run loop
//! - [`DocumentStore`]: Trait implemented by every backend
//! - [`Config`]: Application configuration management

pub mod controller;
pub mod error;
pub mod events;
pub mod identity;
pub mod persistence;
pub mod storage;
pub mod store;
pub mod timer;

pub use controller::{Command, LoadOutcome, PomodoroController, TICK_INTERVAL};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use identity::{IdentityGate, UserId};
pub use persistence::{
    await_writes, CalendarClock, FixedCalendar, LocalCalendar, SessionPersistence,
    WRITE_FLUSH_TIMEOUT,
};
pub use storage::{Config, Database, StoreBackend};
pub use store::{
    DocumentKey, DocumentStore, FirestoreConfig, FirestoreStore, MemoryStore, SessionDocument,
    SqliteStore,
};
pub use timer::{format_clock, Durations, Phase, SessionLog, TimerEngine, TimerState};

use std::sync::Arc;

/// Build the document store selected in `config`.
///
/// # Errors
/// Returns an error if the SQLite database cannot be opened or the hosted
/// store has no project configured.
pub fn open_store(config: &Config) -> Result<Arc<dyn DocumentStore>, CoreError> {
    let store: Arc<dyn DocumentStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Sqlite => Arc::new(SqliteStore::open()?),
        StoreBackend::Firestore => {
            let section = &config.store.firestore;
            if section.project_id.trim().is_empty() {
                return Err(ConfigError::MissingKey("store.firestore.project_id".into()).into());
            }
            Arc::new(FirestoreStore::new(FirestoreConfig {
                base_url: section.base_url.clone(),
                project_id: section.project_id.clone(),
                api_key: section.api_key.clone(),
                id_token: config.id_token(),
            }))
        }
    };
    Ok(store)
}
