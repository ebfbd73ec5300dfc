//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tracing::{info, warn};

use nightbrief_core::{Orchestrator, run_scheduler};
use nightbrief_shared::{AppConfig, RunResult, init_config, load_config, validate_secrets};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// nightbrief — unattended nightly AI-news briefings.
#[derive(Parser)]
#[command(
    name = "nightbrief",
    version,
    about = "Search, summarize, and deliver a nightly AI-news briefing.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Start the scheduled service and run until interrupted.
    Run,

    /// Execute one full pipeline run immediately.
    Manual,

    /// Execute a reduced run with the test keyword set.
    Test,

    /// Show scheduler state and the next fire time.
    Status,

    /// Check backend and channel health.
    Health,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default config file if none exists.
    Init,
    /// Print the effective configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "nightbrief=info",
        1 => "nightbrief=debug",
        _ => "nightbrief=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run => cmd_run().await,
        Command::Manual => cmd_manual().await,
        Command::Test => cmd_test().await,
        Command::Status => cmd_status().await,
        Command::Health => cmd_health().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Load config and fail fast on missing secrets.
fn load_validated_config() -> Result<AppConfig> {
    let config = load_config()?;
    validate_secrets(&config)?;
    Ok(config)
}

async fn cmd_run() -> Result<()> {
    let config = load_validated_config()?;
    let orchestrator = Arc::new(Orchestrator::new(config));

    let health = orchestrator.health().await;
    if !health.healthy {
        warn!(
            search_reader = health.search_reader,
            summarizer = health.summarizer,
            "starting degraded: some components are unhealthy"
        );
    }

    info!(
        schedule = orchestrator.config().defaults.cron_schedule,
        utc_offset_hours = orchestrator.config().defaults.utc_offset_hours,
        "scheduler starting"
    );

    tokio::select! {
        result = run_scheduler(Arc::clone(&orchestrator)) => {
            result?;
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, exiting");
            Ok(())
        }
    }
}

async fn cmd_manual() -> Result<()> {
    let config = load_validated_config()?;
    let orchestrator = Orchestrator::new(config);
    report_run(orchestrator.trigger_once().await)
}

async fn cmd_test() -> Result<()> {
    let config = load_validated_config()?;
    let orchestrator = Orchestrator::new(config);
    report_run(orchestrator.trigger_test().await)
}

fn report_run(result: RunResult) -> Result<()> {
    println!(
        "run {} in {:.1}s — searched {}, fetched {}, summarized {}",
        if result.success { "succeeded" } else { "failed" },
        result.duration_secs,
        result.counts.searched,
        result.counts.fetched,
        result.counts.processed,
    );
    if let Some(report) = &result.report {
        println!("report: {}", report.title);
    }
    match result.error {
        None => Ok(()),
        Some(error) => Err(eyre!(error)),
    }
}

async fn cmd_status() -> Result<()> {
    let config = load_config()?;
    let orchestrator = Orchestrator::new(config);
    let status = orchestrator.status()?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

async fn cmd_health() -> Result<()> {
    let config = load_validated_config()?;
    let orchestrator = Orchestrator::new(config);
    let state = orchestrator.health().await;

    println!("search/reader: {}", verdict(state.search_reader));
    println!("summarizer:    {}", verdict(state.summarizer));
    for channel in &state.channels {
        println!("channel {:<8} {}", format!("{}:", channel.name), verdict(channel.healthy));
    }
    println!("overall:       {}", verdict(state.healthy));

    if state.healthy {
        Ok(())
    } else {
        Err(eyre!("system is degraded"))
    }
}

fn verdict(healthy: bool) -> &'static str {
    if healthy { "ok" } else { "unhealthy" }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
