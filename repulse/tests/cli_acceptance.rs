use repulse_core::{DailyRecord, Database, ResourceKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Isolated working directory with no credentials in the environment
struct CliTestEnv {
    temp_dir: TempDir,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        Self { temp_dir }
    }

    fn cwd(&self) -> &Path {
        self.temp_dir.path()
    }

    fn db_path(&self) -> PathBuf {
        self.cwd().join("data/github_traffic.db")
    }

    fn write(&self, name: &str, contents: &str) {
        fs::write(self.cwd().join(name), contents)
            .unwrap_or_else(|e| panic!("failed to write {name}: {e}"));
    }

    /// Everything written under `data/logs`, across rotated files
    fn log_contents(&self) -> String {
        let log_dir = self.cwd().join("data/logs");
        let mut contents = String::new();
        for entry in fs::read_dir(&log_dir).expect("log dir should exist") {
            let path = entry.expect("failed to read log dir entry").path();
            contents.push_str(&fs::read_to_string(&path).unwrap_or_default());
        }
        contents
    }

    fn seed(&self) {
        let db = Database::open(&self.db_path()).expect("failed to open db");
        db.migrate().expect("failed to migrate db");
        db.upsert_records(
            ResourceKind::Views,
            &[
                record("2026-10-15T00:00:00Z", 12, Some(5)),
                record("2026-10-16T00:00:00Z", 8, Some(3)),
            ],
        )
        .expect("failed to seed views");
        db.upsert_records(
            ResourceKind::Stars,
            &[record("2026-10-16T00:00:00Z", 42, None)],
        )
        .expect("failed to seed stars");
    }
}

fn record(timestamp: &str, count: u64, uniques: Option<u64>) -> DailyRecord {
    DailyRecord {
        timestamp: timestamp.to_string(),
        count,
        uniques,
    }
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("repulse"));

    Command::new(bin_path)
        .args(args)
        .current_dir(env.cwd())
        .env_remove("GH_TOKEN")
        .env_remove("OWNER")
        .env_remove("REPO")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute repulse: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "repulse {} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        args.join(" "),
        output.status,
        stdout,
        stderr
    );
}

#[test]
fn collect_without_credentials_fails_before_touching_database() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["collect", "--skip-report"]);
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stdout.contains("Warning: No .env file found. Using system environment variables."),
        "expected dotfile warning, got:\n{stdout}"
    );
    assert!(
        stderr.contains("GH_TOKEN is not set"),
        "expected missing token error, got:\n{stderr}"
    );
    assert!(!env.db_path().exists());
}

#[test]
fn default_command_is_collect() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &[]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GH_TOKEN"), "got:\n{stderr}");
}

#[test]
fn env_file_supplies_credentials_in_key_order() {
    let env = CliTestEnv::new();
    env.write("creds.env", "GH_TOKEN=ghp_from_file\n");

    let output = run_bin(&env, &["--env-file", "creds.env", "collect"]);
    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stdout.contains("No .env file found"), "got:\n{stdout}");
    assert!(
        stderr.contains("OWNER is not set"),
        "expected OWNER to be the first missing key, got:\n{stderr}"
    );
}

#[test]
fn invalid_config_is_rejected() {
    let env = CliTestEnv::new();
    env.write("repulse.toml", "[github]\ntimeout_secs = 0\n");

    let output = run_bin(&env, &["show"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("timeout_secs"), "got:\n{stderr}");
}

#[test]
fn unknown_resource_kind_is_usage_error() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["collect", "--only", "forks"]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown resource kind"), "got:\n{stderr}");
}

#[test]
fn show_on_empty_database_succeeds() {
    let env = CliTestEnv::new();

    let args = ["show"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No traffic recorded yet."), "got:\n{stdout}");
    assert!(env.db_path().exists());
}

#[test]
fn show_prints_newest_day_first() {
    let env = CliTestEnv::new();
    env.seed();

    let args = ["show"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let newest = stdout.find("2026-10-16").expect("missing Oct 16 row");
    let oldest = stdout.find("2026-10-15").expect("missing Oct 15 row");
    assert!(newest < oldest, "expected newest first, got:\n{stdout}");
}

#[test]
fn show_json_emits_stored_rows() {
    let env = CliTestEnv::new();
    env.seed();

    let args = ["show", "--json", "--limit", "1"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let rows: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let rows = rows.as_array().expect("expected a JSON array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["timestamp"], "2026-10-16T00:00:00Z");
    assert_eq!(rows[0]["views"], 8);
    assert_eq!(rows[0]["unique_views"], 3);
    assert_eq!(rows[0]["total_stars"], 42);
}

#[test]
fn show_respects_db_override() {
    let env = CliTestEnv::new();
    let custom = env.cwd().join("elsewhere/traffic.db");
    {
        let db = Database::open(&custom).expect("failed to open db");
        db.migrate().expect("failed to migrate db");
        db.upsert_records(
            ResourceKind::Clones,
            &[record("2026-10-01T00:00:00Z", 3, Some(2))],
        )
        .expect("failed to seed clones");
    }

    let db_arg = custom.to_string_lossy().into_owned();
    let args = ["show", "--db", db_arg.as_str()];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2026-10-01"), "got:\n{stdout}");
    assert!(!env.db_path().exists());
}

#[test]
fn startup_events_reach_the_log_file() {
    let env = CliTestEnv::new();

    let args = ["show"];
    let output = run_bin(&env, &args);
    assert_success(&args, &output);

    let log = env.log_contents();
    assert!(
        log.contains("No config file found, using defaults"),
        "expected missing config event in log, got:\n{log}"
    );
    assert!(log.contains("repulse.log"), "got:\n{log}");
}
