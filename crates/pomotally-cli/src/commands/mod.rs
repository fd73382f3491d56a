pub mod config;
pub mod log;
pub mod run;
pub mod timer;

use pomotally_core::UserId;

/// Multi-threaded runtime for the commands that talk to a store.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

/// `--user` flag if given, otherwise the configured identity.
pub fn resolve_user(
    flag: Option<String>,
    config: &pomotally_core::Config,
) -> Result<Option<UserId>, Box<dyn std::error::Error>> {
    match flag {
        Some(raw) => Ok(Some(UserId::new(raw)?)),
        None => Ok(config.user()),
    }
}
