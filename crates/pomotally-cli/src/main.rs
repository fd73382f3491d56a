use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "pomotally", version, about = "Pomodoro timer with a daily session tally")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive timer session
    Run(commands::run::RunArgs),
    /// One-shot timer control (state kept between invocations)
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Stored session logs
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("POMOTALLY_LOG").unwrap_or_else(|_| {
        let configured = pomotally_core::Config::load_or_default().logging.filter;
        EnvFilter::try_new(configured).unwrap_or_else(|_| EnvFilter::new("warn"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Log { action } => commands::log::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
