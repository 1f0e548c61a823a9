mod paths;
mod prompt;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planar_core::{
    load_config, load_default_config, validate_config, CatalogSource, FixedVersionGate,
    MtgjsonSource, RemoteGateway, RunOutcome, RunReport, ScryfallGateway, SyncOrchestrator,
    VersionGate,
};

use paths::{resolve_config_path, resolve_data_dir, CONFIG_ENV, DATA_DIR_ENV};
use prompt::StdinVersionGate;

/// Exit status for a run stopped by Ctrl+C or SIGTERM.
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser, Debug)]
#[command(name = "planar-bridge", version, about = "Keep a local card image library in sync")]
struct Args {
    /// Config file (defaults to $PLANAR_BRIDGE_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding set folders and catalog snapshots (overrides config and $PLANAR_BRIDGE_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Continue without asking when the catalog version is unsupported
    #[arg(long, default_value_t = false)]
    yes: bool,

    /// Walk every set even when the local catalog is current
    #[arg(long, default_value_t = false)]
    force: bool,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(args.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!args.json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    match run(args).await {
        Ok(outcome) => std::process::exit(exit_code(outcome)),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<RunOutcome> {
    let config_env = std::env::var(CONFIG_ENV).ok();
    let mut config = match resolve_config_path(args.config.as_deref(), config_env.as_deref()) {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => {
            info!("No config file, using defaults");
            load_default_config().context("Failed to load default config")?
        }
    };
    validate_config(&config).context("Configuration validation failed")?;

    if args.force {
        config.sync.always_pull = true;
    }

    let data_env = std::env::var(DATA_DIR_ENV).ok();
    let data_dir = resolve_data_dir(
        args.data_dir.as_deref(),
        data_env.as_deref(),
        config.storage.data_dir.as_deref(),
    )?;
    info!("Data directory: {:?}", data_dir);

    let gateway: Arc<dyn RemoteGateway> = Arc::new(
        ScryfallGateway::new(&config.gateway).context("Failed to create image provider client")?,
    );
    let source: Arc<dyn CatalogSource> = Arc::new(
        MtgjsonSource::new(&config.gateway).context("Failed to create catalog client")?,
    );
    let gate: Arc<dyn VersionGate> = if args.yes {
        Arc::new(FixedVersionGate(true))
    } else {
        Arc::new(StdinVersionGate)
    };

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Interrupt received, stopping after the current card");
        signal_token.cancel();
    });

    let orchestrator =
        SyncOrchestrator::new(config, data_dir, gateway, source, gate).with_cancellation(cancel);
    let report = orchestrator.run().await?;
    log_summary(&report);

    Ok(report.outcome)
}

fn log_summary(report: &RunReport) {
    match report.outcome {
        RunOutcome::Finished => info!(
            "Processed {} sets ({} already complete, {} omitted): {} new, {} enhanced",
            report.sets_processed,
            report.sets_skipped_complete,
            report.sets_omitted,
            report.cards_new,
            report.cards_upgraded
        ),
        RunOutcome::UpToDate => info!("Up to date"),
        RunOutcome::Declined => info!("Stopped: catalog version not confirmed"),
        RunOutcome::Interrupted => info!(
            "Interrupted after {} sets: {} new, {} enhanced",
            report.sets_processed, report.cards_new, report.cards_upgraded
        ),
    }
}

fn exit_code(outcome: RunOutcome) -> i32 {
    match outcome {
        RunOutcome::Finished | RunOutcome::UpToDate | RunOutcome::Declined => 0,
        RunOutcome::Interrupted => EXIT_INTERRUPTED,
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
