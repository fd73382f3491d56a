use clap::Subcommand;
use pomotally_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting
    Get {
        /// Dot-path key (e.g. "timer.focus_minutes", "identity.user",
        /// "store.backend")
        key: String,
    },
    /// Change one setting and save
    Set {
        /// Dot-path key
        key: String,
        /// New value; minute lengths must be at least 1
        value: String,
    },
    /// Print every setting as JSON
    List,
    /// Restore default lengths, store and logging
    Reset {
        /// Also forget the signed-in user and token
        #[arg(long)]
        identity: bool,
    },
    /// Print the location of config.toml
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Reset { identity } => {
            let mut config = if identity {
                Config::default()
            } else {
                Config::load_or_default()
            };
            config.reset_keeping_identity();
            config.save()?;
            match config.user() {
                Some(user) => println!("settings reset; still signed in as {user}"),
                None => println!("settings reset"),
            }
        }
        ConfigAction::Path => println!("{}", Config::path()?.display()),
    }
    Ok(())
}
