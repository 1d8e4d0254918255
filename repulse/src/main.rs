//! repulse - collect repository traffic into a local SQLite database
//!
//! Reads `GH_TOKEN`, `OWNER` and `REPO` from the environment (optionally via
//! a `.env` file), pulls clones, views, release downloads and stars from the
//! GitHub API, and upserts them by day.
//!
//! All paths are relative to the working directory:
//! - Database: data/github_traffic.db
//! - Logs: data/logs/repulse.log
//! - Config: repulse.toml (optional)

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use repulse_core::config::load_dotenv;
use repulse_core::pipeline::Progress;
use repulse_core::{
    report, Collector, Config, Credentials, Database, ReqwestTransport, ResourceKind, RunSummary,
    TrafficRow,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "repulse")]
#[command(about = "Collect repository traffic metrics into SQLite")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to ./repulse.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dotfile with GH_TOKEN, OWNER and REPO
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch all metrics and store them (default)
    Collect(CollectArgs),
    /// Print stored traffic, newest day first
    Show(ShowArgs),
}

#[derive(Args, Default)]
struct CollectArgs {
    /// Only collect this resource (repeatable): clones, views, downloads, stars
    #[arg(long = "only", value_name = "KIND")]
    only: Vec<ResourceKind>,

    /// Do not run the report program afterwards
    #[arg(long)]
    skip_report: bool,

    /// Database file (overrides the configured path)
    #[arg(long)]
    db: Option<PathBuf>,
}

#[derive(Args)]
struct ShowArgs {
    /// Number of days to print
    #[arg(short = 'n', long, default_value = "30")]
    limit: usize,

    /// Print rows as JSON
    #[arg(long)]
    json: bool,

    /// Database file (overrides the configured path)
    #[arg(long)]
    db: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    let _log_guard = repulse_core::logging::init(&config.logging, &config.storage.log_dir())
        .context("failed to initialize logging")?;

    tracing::info!("repulse starting");

    if cli.config.is_none() && !Config::config_path().exists() {
        tracing::info!(
            path = %Config::config_path().display(),
            "No config file found, using defaults"
        );
    }

    match cli.command {
        Some(Command::Show(args)) => run_show(&config, &args),
        Some(Command::Collect(args)) => run_collect(&config, &cli.env_file, &args),
        None => run_collect(&config, &cli.env_file, &CollectArgs::default()),
    }
}

fn run_collect(config: &Config, env_file: &Path, args: &CollectArgs) -> Result<()> {
    if !load_dotenv(env_file) {
        println!("Warning: No .env file found. Using system environment variables.");
    }

    // Missing credentials stop the run before any network traffic
    let credentials = Credentials::from_env().context("missing credentials")?;
    let repo = credentials.slug();

    let kinds = if args.only.is_empty() {
        config.github.ordered_resources()
    } else {
        args.only.clone()
    };

    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| config.storage.database_path());
    tracing::info!(path = %db_path.display(), "Opening database");

    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    println!("Repository: {}", repo);
    println!("Database: {}", db_path.display());

    let transport =
        ReqwestTransport::new(&config.github).context("failed to create HTTP client")?;
    let collector = Collector::new(credentials, transport, &config.github);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("invalid progress template")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = collector.collect(&db, &kinds, |progress| match progress {
        Progress::Fetching(kind) => {
            pb.set_message(format!("fetching {}", kind));
            pb.suspend(|| println!("fetching {}", kind));
        }
        Progress::Fetched { kind, records } => {
            pb.suspend(|| println!("{} fetched ({} records)", kind, records));
        }
        Progress::Stored { kind, rows } => {
            pb.suspend(|| println!("{} stored ({} rows)", kind, rows));
        }
    });

    pb.finish_and_clear();
    let summary = result.context("collection failed")?;

    print_summary(&summary);

    if args.skip_report {
        tracing::info!("Report skipped");
    } else if let Err(e) = report::generate(&config.report) {
        // Stored data is already committed; a failed report does not fail the run
        tracing::warn!(error = %e, "Report generation failed");
        eprintln!("Warning: {}", e);
    }

    tracing::info!(requests = summary.requests, "repulse complete");
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("Collection complete:");
    for kind in &summary.per_kind {
        println!(
            "  {:<10} {:>4} record(s), {:>4} row(s) upserted",
            kind.kind.as_str(),
            kind.records,
            kind.rows
        );
    }
    println!("  API requests: {}", summary.requests);
}

fn run_show(config: &Config, args: &ShowArgs) -> Result<()> {
    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| config.storage.database_path());

    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let rows = db
        .list_days(Some(args.limit))
        .context("failed to query traffic")?;

    if args.json {
        let json = serde_json::to_string_pretty(&rows).context("failed to serialize rows")?;
        println!("{}", json);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No traffic recorded yet.");
        return Ok(());
    }

    print_table(&rows);
    Ok(())
}

fn print_table(rows: &[TrafficRow]) {
    println!(
        "{:<22} {:>8} {:>8} {:>8} {:>8} {:>10} {:>8}",
        "DAY", "CLONES", "UNIQUE", "VIEWS", "UNIQUE", "DOWNLOADS", "STARS"
    );
    for row in rows {
        println!(
            "{:<22} {:>8} {:>8} {:>8} {:>8} {:>10} {:>8}",
            row.timestamp,
            row.clones,
            row.unique_clones,
            row.views,
            row.unique_views,
            row.total_downloads,
            row.total_stars
        );
    }
}
