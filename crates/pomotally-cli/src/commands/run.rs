use clap::Args;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use pomotally_core::{
    Command, Config, Durations, Event, PomodoroController, SessionPersistence, TimerEngine, UserId,
};

use super::{resolve_user, runtime};

const HELP: &str = "\
commands: <enter>/toggle  start  pause  focus  break
          focus-min N  rest-min N  signin USER  signout  status  quit";

#[derive(Args)]
pub struct RunArgs {
    /// Focus length in minutes (defaults to timer.focus_minutes)
    #[arg(long)]
    focus: Option<u32>,
    /// Rest length in minutes (defaults to timer.rest_minutes)
    #[arg(long)]
    rest: Option<u32>,
    /// Signed-in user (defaults to identity.user)
    #[arg(long)]
    user: Option<String>,
    /// Print events as JSON lines instead of the clock face
    #[arg(long)]
    json: bool,
}

/// One line typed at the prompt.
enum Input {
    Timer(Command),
    SignIn(UserId),
    SignOut,
    Help,
}

impl Input {
    fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("signin") => UserId::new(words.next()?).ok().map(Input::SignIn),
            Some("signout") => Some(Input::SignOut),
            Some("help") | Some("?") => Some(Input::Help),
            _ => Command::parse(line).map(Input::Timer),
        }
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let rt = runtime()?;
    let result = rt.block_on(session(args, config));
    // Don't wait on a stdin read still parked in the blocking pool.
    rt.shutdown_background();
    result
}

async fn session(args: RunArgs, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let durations = Durations::new(
        args.focus.unwrap_or(config.timer.focus_minutes),
        args.rest.unwrap_or(config.timer.rest_minutes),
    );
    let user = resolve_user(args.user, &config)?;
    let store = pomotally_core::open_store(&config)?;
    tracing::info!(store = store.name(), "starting session");

    let controller =
        PomodoroController::new(TimerEngine::new(durations), SessionPersistence::new(store));
    let (commands, commands_rx) = mpsc::channel(16);
    let (identity, identity_rx) = watch::channel(user);
    let (events_tx, mut events) = mpsc::unbounded_channel();

    let driver = tokio::spawn(controller.run(commands_rx, identity_rx, events_tx));
    let json = args.json;
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            render(&event, json);
        }
    });

    if !json {
        println!("{HELP}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Input::parse(&line) {
            Some(Input::Timer(Command::Shutdown)) => break,
            Some(Input::Timer(command)) => {
                if commands.send(command).await.is_err() {
                    break;
                }
            }
            Some(Input::SignIn(user)) => {
                identity.send_replace(Some(user));
            }
            Some(Input::SignOut) => {
                identity.send_replace(None);
            }
            Some(Input::Help) => println!("{HELP}"),
            None => tracing::debug!(input = %line.trim(), "ignored input"),
        }
    }

    let _ = commands.send(Command::Shutdown).await;
    let engine = driver.await?;
    printer.await?;

    if !json {
        println!(
            "\ncompleted {} focus session(s), {} min",
            engine.completed_sessions(),
            engine.session_log().total_secs() / 60
        );
    }
    Ok(())
}

fn render(event: &Event, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{line}");
        }
        return;
    }

    let mut out = std::io::stdout().lock();
    let _ = match event {
        Event::StateSnapshot {
            phase,
            running,
            clock,
            completed_sessions,
            ..
        } => write!(
            out,
            "\r{:<10} {clock}  [{}]  completed: {completed_sessions}   ",
            phase.label(),
            if *running { "running" } else { "paused" },
        ),
        Event::FocusCompleted {
            completed_sessions, ..
        } => writeln!(
            out,
            "\rfocus session complete, {completed_sessions} today. time to rest"
        ),
        Event::RestCompleted { .. } => writeln!(out, "\rrest over, back to focus"),
        Event::SessionLogRestored {
            completed_sessions, ..
        } => writeln!(out, "\rrestored {completed_sessions} session(s) from today"),
        _ => Ok(()),
    };
    let _ = out.flush();
}
