//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::io::Write;
use std::process::{Command, Stdio};

use chrono::{Duration, Local, Utc};
use pomotally_core::Database;
use serde_json::Value;
use tempfile::TempDir;

struct Cli {
    dir: TempDir,
}

impl Cli {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_pomotally"));
        cmd.env("POMOTALLY_DATA_DIR", self.dir.path())
            .env_remove("POMOTALLY_ID_TOKEN")
            .env("POMOTALLY_LOG", "off");
        cmd
    }

    /// Run a CLI command and return (code, stdout, stderr).
    fn run(&self, args: &[&str]) -> (i32, String, String) {
        let output = self
            .command()
            .args(args)
            .output()
            .expect("Failed to execute CLI command");
        (
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
        )
    }

    fn run_with_stdin(&self, args: &[&str], input: &str) -> (i32, String) {
        let mut child = self
            .command()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn CLI");
        child
            .stdin
            .take()
            .expect("stdin")
            .write_all(input.as_bytes())
            .expect("write stdin");
        let output = child.wait_with_output().expect("wait");
        (
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).to_string(),
        )
    }
}

/// Every JSON document in `out`, in order.
fn json_values(out: &str) -> Vec<Value> {
    serde_json::Deserializer::from_str(out)
        .into_iter::<Value>()
        .collect::<Result<_, _>>()
        .expect("stdout is a JSON stream")
}

#[test]
fn test_config_set_then_get() {
    let cli = Cli::new();
    let (code, out, _) = cli.run(&["config", "set", "timer.focus_minutes", "50"]);
    assert_eq!(code, 0);
    assert_eq!(out.trim(), "ok");

    let (code, out, _) = cli.run(&["config", "get", "timer.focus_minutes"]);
    assert_eq!(code, 0);
    assert_eq!(out.trim(), "50");
}

#[test]
fn test_config_unset_identity_reads_empty() {
    let cli = Cli::new();
    let (code, out, _) = cli.run(&["config", "get", "identity.user"]);
    assert_eq!(code, 0);
    assert_eq!(out.trim(), "");
}

#[test]
fn test_config_rejects_bad_values() {
    let cli = Cli::new();
    let (code, _, err) = cli.run(&["config", "set", "timer.rest_minutes", "0"]);
    assert_eq!(code, 1);
    assert!(err.contains("error:"));

    let (code, _, _) = cli.run(&["config", "get", "timer.nope"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_list_is_json() {
    let cli = Cli::new();
    let (code, out, _) = cli.run(&["config", "list"]);
    assert_eq!(code, 0);
    let parsed: Value = serde_json::from_str(&out).expect("json");
    assert_eq!(parsed["timer"]["focus_minutes"], 25);
    assert_eq!(parsed["store"]["backend"], "sqlite");
}

#[test]
fn test_timer_status_starts_idle_in_focus() {
    let cli = Cli::new();
    let (code, out, _) = cli.run(&["timer", "status"]);
    assert_eq!(code, 0);
    let values = json_values(&out);
    let snapshot = values.last().expect("snapshot");
    assert_eq!(snapshot["type"], "state_snapshot");
    assert_eq!(snapshot["phase"], "focus");
    assert_eq!(snapshot["running"], false);
    assert_eq!(snapshot["clock"], "25:00");
}

#[test]
fn test_timer_start_then_pause() {
    let cli = Cli::new();
    let (code, out, _) = cli.run(&["timer", "start"]);
    assert_eq!(code, 0);
    let values = json_values(&out);
    assert_eq!(values[0]["type"], "timer_started");
    assert_eq!(values.last().expect("snapshot")["running"], true);

    let (code, out, _) = cli.run(&["timer", "pause"]);
    assert_eq!(code, 0);
    let values = json_values(&out);
    assert!(values.iter().any(|v| v["type"] == "timer_paused"));
    assert_eq!(values.last().expect("snapshot")["running"], false);
}

#[test]
fn test_timer_set_focus_resizes_idle_countdown() {
    let cli = Cli::new();
    let (code, _, _) = cli.run(&["timer", "set-focus", "1"]);
    assert_eq!(code, 0);

    let (_, out, _) = cli.run(&["timer", "status"]);
    let values = json_values(&out);
    assert_eq!(values.last().expect("snapshot")["clock"], "01:00");
}

#[test]
fn test_timer_break_then_focus() {
    let cli = Cli::new();
    let (_, out, _) = cli.run(&["timer", "break"]);
    let values = json_values(&out);
    assert_eq!(values.last().expect("snapshot")["phase"], "rest");
    assert_eq!(values.last().expect("snapshot")["clock"], "05:00");

    let (_, out, _) = cli.run(&["timer", "focus"]);
    let values = json_values(&out);
    assert_eq!(values.last().expect("snapshot")["phase"], "focus");
}

#[test]
fn test_log_show_empty_for_new_user() {
    let cli = Cli::new();
    let (code, out, _) = cli.run(&[
        "log",
        "show",
        "--user",
        "ada@example.com",
        "--date",
        "2024-05-01",
    ]);
    assert_eq!(code, 0);
    let report: Value = serde_json::from_str(&out).expect("json");
    assert_eq!(report["user"], "ada@example.com");
    assert_eq!(report["date"], "2024-05-01");
    assert_eq!(report["completed_sessions"], 0);
    assert_eq!(report["entries"], serde_json::json!([]));
}

#[test]
fn test_log_show_requires_user() {
    let cli = Cli::new();
    let (code, _, err) = cli.run(&["log", "show"]);
    assert_eq!(code, 1);
    assert!(err.contains("no user"));
}

#[test]
fn test_run_status_then_quit() {
    let cli = Cli::new();
    let (code, out) = cli.run_with_stdin(&["run", "--json", "--focus", "1"], "status\nquit\n");
    assert_eq!(code, 0);

    let snapshots: Vec<Value> = out
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter(|v| v["type"] == "state_snapshot")
        .collect();
    assert!(!snapshots.is_empty());
    assert_eq!(snapshots[0]["clock"], "01:00");
    assert_eq!(snapshots[0]["running"], false);
}

#[test]
fn test_run_exits_on_eof() {
    let cli = Cli::new();
    let (code, out) = cli.run_with_stdin(&["run"], "");
    assert_eq!(code, 0);
    assert!(out.contains("completed 0 focus session(s)"));
}

#[test]
fn test_timer_writes_completed_focus_for_signed_in_user() {
    let cli = Cli::new();
    cli.run(&["config", "set", "identity.user", "ada@example.com"]);
    cli.run(&["config", "set", "timer.focus_minutes", "1"]);
    let (code, _, _) = cli.run(&["timer", "start"]);
    assert_eq!(code, 0);

    // Pretend the timer was started 70 seconds ago.
    let db = Database::open_at(cli.dir.path().join("pomotally.db")).expect("db");
    let raw = db.kv_get("timer_state").expect("kv").expect("saved timer");
    let mut state: Value = serde_json::from_str(&raw).expect("json");
    state["saved_at"] = Value::String((Utc::now() - Duration::seconds(70)).to_rfc3339());
    db.kv_set("timer_state", &state.to_string()).expect("kv");
    drop(db);

    let (code, out, _) = cli.run(&["timer", "status"]);
    assert_eq!(code, 0);
    let values = json_values(&out);
    assert!(values.iter().any(|v| v["type"] == "focus_completed"));
    assert_eq!(values.last().expect("snapshot")["phase"], "rest");

    let today = Local::now().date_naive().to_string();
    let (code, out, _) = cli.run(&["log", "show", "--date", &today]);
    assert_eq!(code, 0);
    let report: Value = serde_json::from_str(&out).expect("json");
    assert_eq!(report["user"], "ada@example.com");
    assert_eq!(report["completed_sessions"], 1);
    assert_eq!(report["entries"], serde_json::json!([60]));
}

#[test]
fn test_config_reset_keeps_identity() {
    let cli = Cli::new();
    cli.run(&["config", "set", "identity.user", "ada@example.com"]);
    cli.run(&["config", "set", "timer.rest_minutes", "15"]);

    let (code, _, _) = cli.run(&["config", "reset"]);
    assert_eq!(code, 0);

    let (_, out, _) = cli.run(&["config", "get", "timer.rest_minutes"]);
    assert_eq!(out.trim(), "5");
    let (_, out, _) = cli.run(&["config", "get", "identity.user"]);
    assert_eq!(out.trim(), "ada@example.com");
}

#[test]
fn test_config_path_is_inside_data_dir() {
    let cli = Cli::new();
    let (code, out, _) = cli.run(&["config", "path"]);
    assert_eq!(code, 0);
    let path = std::path::PathBuf::from(out.trim());
    assert_eq!(path, cli.dir.path().join("config.toml"));
}
