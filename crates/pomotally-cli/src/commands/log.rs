use chrono::NaiveDate;
use clap::Subcommand;
use serde::Serialize;

use pomotally_core::{CalendarClock, Config, LocalCalendar, SessionPersistence};

use super::{resolve_user, runtime};

#[derive(Subcommand)]
pub enum LogAction {
    /// Print the stored session log for a user and date
    Show {
        /// User identity (defaults to identity.user)
        #[arg(long)]
        user: Option<String>,
        /// Calendar date as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Serialize)]
struct LogReport {
    user: String,
    date: NaiveDate,
    completed_sessions: usize,
    total_focus_min: u64,
    entries: Vec<u64>,
}

pub fn run(action: LogAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        LogAction::Show { user, date } => {
            let config = Config::load()?;
            let user = resolve_user(user, &config)?
                .ok_or("no user: pass --user or set identity.user")?;
            let date = date.unwrap_or_else(|| LocalCalendar.today());
            let store = pomotally_core::open_store(&config)?;
            let persistence = SessionPersistence::new(store);

            let log = runtime()?
                .block_on(persistence.load_session_log(&user, date))
                .unwrap_or_default();

            let report = LogReport {
                user: user.to_string(),
                date,
                completed_sessions: log.count(),
                total_focus_min: log.total_secs() / 60,
                entries: log.into_entries(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
