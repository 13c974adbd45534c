//! Tender Engine - automated waste-collection tender generation
//!
//! # Usage
//!
//! ```bash
//! # Run the volume monitor (default: every 30 minutes)
//! tender-engine
//!
//! # One tick, JSON report on stdout
//! tender-engine --once
//!
//! # Explicit config, faster cadence
//! tender-engine --config engine.toml --interval-secs 600
//!
//! # Print the effective configuration and any warnings
//! tender-engine check-config
//!
//! # Load demand, areas and providers from a JSON file
//! tender-engine seed --file fixtures.json
//! ```
//!
//! # Environment Variables
//!
//! - `TENDER_ENGINE_CONFIG`: config file path (default: ./tender_engine.toml)
//! - `TENDER_INTERVAL_SECS`: overrides `monitor.interval_secs`
//! - `RUST_LOG`: logging level (default: info)
//! - `LOG_FORMAT`: set to `json` for JSON log lines

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tender_engine::config::{validation, EngineConfig};
use tender_engine::storage::{ProcessLock, SeedData, SledStore};
use tender_engine::{LogNotifier, MonitorPorts, StopOutcome, VolumeMonitor};

/// Subdirectory of the data dir holding the sled database
const STORE_DIR: &str = "tender_store";

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "tender-engine")]
#[command(about = "Automated waste-collection tender generation")]
#[command(version)]
struct CliArgs {
    /// Config file (overrides TENDER_ENGINE_CONFIG and ./tender_engine.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Data directory for the store and process lock
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Seconds between ticks (overrides config and TENDER_INTERVAL_SECS)
    #[arg(long, value_name = "SECS")]
    interval_secs: Option<u64>,

    /// Run a single tick, print its report as JSON and exit
    #[arg(long)]
    once: bool,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Print the effective configuration as TOML plus validation results
    CheckConfig,

    /// Import pending demand, special areas, area volume and providers
    Seed {
        /// JSON file with `pending_demand`, `special_areas`, `area_volumes`
        /// and `service_providers` arrays
        #[arg(long)]
        file: PathBuf,
    },
}

// ============================================================================
// Setup
// ============================================================================

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    // stdout is reserved for --once and check-config output
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(args: &CliArgs) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::load(),
    };
    if let Some(dir) = &args.data_dir {
        config.storage.data_dir.clone_from(dir);
    }
    Ok(config)
}

fn tick_interval(args: &CliArgs, config: &EngineConfig) -> Result<Duration> {
    match args.interval_secs {
        Some(0) => bail!("--interval-secs must be greater than zero"),
        Some(secs) => Ok(Duration::from_secs(secs)),
        None => Ok(config.tick_interval()),
    }
}

// ============================================================================
// Commands
// ============================================================================

fn check_config(config: &EngineConfig) -> Result<()> {
    println!("{}", config.to_toml()?);

    let (errors, warnings) = validation::validate_ranges(config);
    for w in &warnings {
        eprintln!("warning: {w}");
    }
    for e in &errors {
        eprintln!("error: {e}");
    }
    if !errors.is_empty() {
        bail!("{} configuration error(s)", errors.len());
    }
    eprintln!("Configuration OK ({} warning(s))", warnings.len());
    Ok(())
}

fn seed(config: &EngineConfig, file: &Path) -> Result<()> {
    let _lock = ProcessLock::acquire(&config.storage.data_dir)?;
    let store = SledStore::open(config.storage.data_dir.join(STORE_DIR))?;

    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read seed file {}", file.display()))?;
    let data: SeedData = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse seed file {}", file.display()))?;

    store.import(&data)?;
    Ok(())
}

async fn run(config: EngineConfig, interval: Duration, once: bool) -> Result<()> {
    let _lock = ProcessLock::acquire(&config.storage.data_dir)?;
    let store = Arc::new(
        SledStore::open(config.storage.data_dir.join(STORE_DIR))
            .context("Failed to open tender store")?,
    );

    let ports = MonitorPorts::from_store(Arc::clone(&store), Arc::new(LogNotifier));
    let monitor = Arc::new(VolumeMonitor::new(&config, ports));

    if once {
        let report = monitor.run_once(Utc::now()).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    info!(
        interval_secs = interval.as_secs(),
        data_dir = %config.storage.data_dir.display(),
        bands = config.truck_classes.len(),
        "Tender engine starting"
    );
    let handle = monitor.start(interval);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    info!("Received Ctrl+C, stopping volume monitor");

    match handle.stop().await {
        StopOutcome::Graceful => info!("Volume monitor stopped cleanly"),
        StopOutcome::Abandoned => warn!("Volume monitor abandoned an in-flight tick"),
        StopOutcome::Failed(reason) => error!(%reason, "Volume monitor task failed"),
    }

    store.flush()?;
    info!("Tender engine shutdown complete");
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = CliArgs::parse();
    let config = load_config(&args)?;

    match &args.command {
        Some(SubCommand::CheckConfig) => check_config(&config),
        Some(SubCommand::Seed { file }) => seed(&config, file),
        None => {
            let interval = tick_interval(&args, &config)?;
            run(config, interval, args.once).await
        }
    }
}
