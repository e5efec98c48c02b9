//! gotobi CLI - one-shot settlement-day signal runs
//!
//! Meant to be invoked by an external scheduler (cron, CI schedule) every few
//! minutes during the Tokyo morning.
//!
//! ## Example Usage
//!
//! ```bash
//! # Evaluate now and deliver to the configured sinks
//! gotobi run
//!
//! # Evaluate a specific instant, print only
//! gotobi run --at "2024-01-10 07:30" --dry-run
//!
//! # Settlement days of a month
//! gotobi calendar --month 2024-05
//! ```

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone};
use clap::{Parser, Subcommand};
use colored::Colorize;
use gotobi_signal::calendar::SettlementCalendar;
use gotobi_signal::config::EngineConfig;
use gotobi_signal::dispatch::{ConsoleSink, Dispatcher};
use gotobi_signal::engine::Engine;
use gotobi_signal::schedule::Phase;
use gotobi_signal::types::{local_now, LocalTime, MARKET_TZ};
use std::path::PathBuf;
use std::process;

/// gotobi: settlement-day FX signal engine
#[derive(Parser)]
#[command(name = "gotobi")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Settlement-day FX signal engine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate once and deliver any signal
    Run {
        /// Instant to evaluate (RFC 3339, or "YYYY-MM-DD HH:MM" in Tokyo time)
        #[arg(long)]
        at: Option<String>,

        /// Print the signal instead of delivering it
        #[arg(long)]
        dry_run: bool,

        /// Bypass calendar and clock gating, emit a diagnostic signal
        #[arg(long)]
        test_override: bool,
    },

    /// Show settlement status of a date
    Classify {
        /// Date (YYYY-MM-DD), defaults to today in Tokyo
        #[arg(long)]
        date: Option<String>,
    },

    /// List settlement days of a month
    Calendar {
        /// Month (YYYY-MM)
        #[arg(long)]
        month: String,
    },

    /// Show the trading window of an instant
    Phase {
        /// Instant (RFC 3339, or "YYYY-MM-DD HH:MM" in Tokyo time)
        #[arg(long)]
        at: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(e) = dispatch_command(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn dispatch_command(cli: Cli) -> Result<()> {
    let config = EngineConfig::load(cli.config.as_deref())
        .context("loading configuration")?
        .with_process_env();

    match cli.command {
        Commands::Run {
            at,
            dry_run,
            test_override,
        } => run(config, at.as_deref(), dry_run, test_override).await,
        Commands::Classify { date } => classify(&config, date.as_deref()),
        Commands::Calendar { month } => calendar(&config, &month),
        Commands::Phase { at } => {
            let now = parse_instant(at.as_deref())?;
            println!("{} {}", now.format("%Y-%m-%d %H:%M JST"), Phase::at(&now).as_str().cyan());
            Ok(())
        }
    }
}

async fn run(mut config: EngineConfig, at: Option<&str>, dry_run: bool, test_override: bool) -> Result<()> {
    if test_override {
        config.test_override = true;
    }
    config.validate()?;
    let now = parse_instant(at)?;

    let mut engine = Engine::from_config(&config).context("building engine")?;
    if dry_run {
        engine = engine.with_dispatcher(Dispatcher::new().with_sink(ConsoleSink::new(config.footer.clone())));
    }

    if engine.run_once(&now).await.is_none() {
        println!("{}", "No signal".dimmed());
    }
    Ok(())
}

fn classify(config: &EngineConfig, date: Option<&str>) -> Result<()> {
    let date = match date {
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{}'", text))?,
        None => local_now().date_naive(),
    };
    let day = config.calendar().classify(date);

    let status = if day.is_settlement_day {
        "settlement day".green().bold()
    } else {
        "not a settlement day".normal()
    };
    println!("{} ({}): {}", date, date.format("%a"), status);
    println!("  category: {} ({})", day.category, day.category.description());
    if let Some(from) = day.carried_from {
        println!("  carried from: {}", from);
    }
    Ok(())
}

fn calendar(config: &EngineConfig, month: &str) -> Result<()> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .with_context(|| format!("invalid month '{}'", month))?;
    let days = config
        .calendar()
        .settlement_days_in_month(first.year(), first.month())?;

    println!("{} {}", "Settlement days in".bold(), month.bold());
    for day in days {
        let carried = day
            .carried_from
            .map(|from| format!(" (carried from {})", from))
            .unwrap_or_default();
        println!(
            "  {} {}  {}{}",
            day.date,
            day.date.format("%a"),
            day.category,
            carried.as_str().dimmed()
        );
    }
    Ok(())
}

fn parse_instant(text: Option<&str>) -> Result<LocalTime> {
    let Some(text) = text else {
        return Ok(local_now());
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&MARKET_TZ));
    }
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M")
        .with_context(|| format!("invalid instant '{}'", text))?;
    MARKET_TZ
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| anyhow!("ambiguous local time '{}'", text))
}
