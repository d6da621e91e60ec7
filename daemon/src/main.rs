//! xTDH daemon — entry point for running the distribution engine.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use config::DaemonConfig;
use xtdh_recalc::{NoopRateReviewer, Recalculator, StatsRebuildRequest, StatsTrigger};
use xtdh_stats::{EngineMetrics, StatsMaterializer};
use xtdh_store::{meta, BalanceStore, IdentityStore, MetaStore, StatsStore};
use xtdh_store_lmdb::LmdbStore;
use xtdh_types::Timestamp;
use xtdh_utils::{format_duration, init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "xtdh-daemon", about = "xTDH distribution engine daemon")]
struct Cli {
    /// Data directory for the LMDB store.
    #[arg(long, env = "XTDH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "XTDH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "XTDH_LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings are
    /// used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run one full recompute, then rebuild and promote the stats slots.
    Run,
    /// Recompute on a fixed cadence until interrupted.
    Watch,
    /// Rebuild and promote the stats slots without recomputing balances.
    RebuildStats,
    /// Show the committed engine state.
    Status {
        /// Emit machine-readable JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<DaemonConfig> {
    let mut config = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => DaemonConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    Ok(config)
}

fn open_store(config: &DaemonConfig) -> anyhow::Result<Arc<LmdbStore>> {
    let store = LmdbStore::open(&config.data_dir, config.map_size())
        .with_context(|| format!("failed to open store at {}", config.data_dir.display()))?;
    Ok(Arc::new(store))
}

/// Spawn the detached worker that serves stats rebuild requests. Returns
/// the trigger handle; the worker exits when every trigger clone is gone.
fn spawn_stats_worker(
    config: &DaemonConfig,
    store: Arc<LmdbStore>,
    metrics: Arc<EngineMetrics>,
) -> (StatsTrigger, Option<tokio::task::JoinHandle<()>>) {
    if !config.enable_stats_worker {
        return (StatsTrigger::disabled(), None);
    }
    let (tx, mut rx) = mpsc::channel::<StatsRebuildRequest>(config.stats_queue_depth);
    let handle = tokio::spawn(async move {
        let materializer = StatsMaterializer::new(store, metrics);
        while let Some(request) = rx.recv().await {
            materializer.try_rebuild(request.cutoff);
        }
    });
    (StatsTrigger::new(tx), Some(handle))
}

async fn run_once(config: &DaemonConfig) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let metrics = Arc::new(EngineMetrics::new());
    let (trigger, worker) = spawn_stats_worker(config, store.clone(), metrics.clone());

    let recalculator = Recalculator::new(store.clone(), Box::new(NoopRateReviewer), trigger);
    metrics.runs_total.inc();
    match recalculator.run(Timestamp::now()) {
        Ok(summary) => {
            metrics
                .run_duration_ms
                .observe(summary.duration.as_millis() as f64);
            metrics.identity_count.set(summary.identity_count as i64);
            info!(
                cutoff_day = summary.cutoff.day(),
                identities = summary.identity_count,
                minted = summary.minted,
                "recompute finished"
            );
        }
        Err(e) => {
            metrics.runs_failed_total.inc();
            return Err(e.into());
        }
    }

    // Dropping the recalculator releases the trigger; the worker drains
    // the queued request and exits.
    drop(recalculator);
    if let Some(handle) = worker {
        handle.await?;
    }
    Ok(())
}

async fn watch(config: &DaemonConfig) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let metrics = Arc::new(EngineMetrics::new());
    let (trigger, _worker) = spawn_stats_worker(config, store.clone(), metrics.clone());
    let recalculator = Recalculator::new(store.clone(), Box::new(NoopRateReviewer), trigger);

    let period = std::time::Duration::from_secs(config.recalc_interval_minutes * 60);
    info!(
        interval = %format_duration(period.as_secs()),
        "watch mode started"
    );
    let mut ticker = tokio::time::interval(period);
    loop {
        // Runs never overlap: the next tick is not serviced until this
        // one's recompute has finished.
        ticker.tick().await;
        metrics.runs_total.inc();
        match recalculator.run(Timestamp::now()) {
            Ok(summary) => {
                metrics
                    .run_duration_ms
                    .observe(summary.duration.as_millis() as f64);
                metrics.identity_count.set(summary.identity_count as i64);
            }
            Err(e) => {
                metrics.runs_failed_total.inc();
                error!(error = %e, "recompute failed, retrying on next tick");
            }
        }
    }
}

fn rebuild_stats(config: &DaemonConfig) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let metrics = Arc::new(EngineMetrics::new());
    let materializer = StatsMaterializer::new(store.clone(), metrics);
    let cutoff = Timestamp::now().day_floor();
    let total = materializer.rebuild_and_activate(cutoff)?;
    info!(granted_total = total, slot = %store.active_slot()?, "stats rebuilt");
    Ok(())
}

#[derive(Serialize)]
struct StatusReport {
    active_slot: String,
    identities: u64,
    balances: u64,
    granted_rate_total: f64,
    last_run_cutoff_day: Option<u64>,
    last_run_duration_ms: Option<u64>,
}

fn read_meta_u64(store: &LmdbStore, key: &str) -> anyhow::Result<Option<u64>> {
    Ok(store.get_meta(key)?.and_then(|bytes| {
        let arr: Option<[u8; 8]> = bytes.try_into().ok();
        arr.map(u64::from_be_bytes)
    }))
}

fn status(config: &DaemonConfig, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let active = store.active_slot()?;
    let report = StatusReport {
        active_slot: active.to_string(),
        identities: store.identity_count()?,
        balances: store.balance_count()?,
        granted_rate_total: store
            .iter_grant_stats(active)?
            .iter()
            .map(|g| g.daily_rate)
            .sum(),
        last_run_cutoff_day: read_meta_u64(&store, meta::LAST_RUN_CUTOFF_KEY)?
            .map(|secs| Timestamp::new(secs).day()),
        last_run_duration_ms: read_meta_u64(&store, meta::LAST_RUN_DURATION_KEY)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("active slot:        {}", report.active_slot);
        println!("identities:         {}", report.identities);
        println!("balances:           {}", report.balances);
        println!("granted rate total: {}", report.granted_rate_total);
        match report.last_run_cutoff_day {
            Some(day) => println!("last run cutoff:    day {}", day),
            None => println!("last run cutoff:    never"),
        }
        if let Some(ms) = report.last_run_duration_ms {
            println!("last run duration:  {}ms", ms);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let format = match config.log_format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Human,
    };
    init_logging(format, &config.log_level);

    if !config.enable_stats_worker {
        warn!("stats worker disabled, slot snapshots will go stale");
    }

    match cli.command {
        Command::Run => run_once(&config).await,
        Command::Watch => watch(&config).await,
        Command::RebuildStats => rebuild_stats(&config),
        Command::Status { json } => status(&config, json),
    }
}
