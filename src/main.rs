//! FRONTRUN: dry-run driver
//!
//! Entry point. Loads configuration, initialises structured logging, builds
//! the configured strategy chain against the simulated venue and evaluates
//! each transaction from the input file. Ctrl+C cancels pending evaluations
//! before any further front-run is issued.

use anyhow::{Context, Result};
use std::fs;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use frontrun::config::AppConfig;
use frontrun::contracts::simulated::SimulatedVenue;
use frontrun::engine::StrategyChain;
use frontrun::strategy::StrategyBindings;
use frontrun::types::Transaction;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        AppConfig::resolve_env("FRONTRUN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    let venue = Arc::new(SimulatedVenue::default());
    let chain = StrategyChain::from_order(
        &cfg.strategies.order,
        &StrategyBindings::from_venue(venue.clone()),
        &cfg.thresholds,
        cfg.runtime,
    )
    .context("Failed to build strategy chain")?;
    if chain.is_empty() {
        anyhow::bail!("No strategies configured in {config_path}");
    }

    info!(
        config = %config_path,
        strategies = ?chain.kinds(),
        thresholds = cfg.thresholds.len(),
        call_timeout_ms = ?cfg.runtime.call_timeout_ms,
        "FRONTRUN starting up (dry run)"
    );

    let transactions = match std::env::args().nth(1) {
        Some(path) => load_transactions(&path)?,
        None => {
            warn!("No transaction file given, evaluating one generated sample");
            vec![sample_transaction()]
        }
    };

    // Cancel in-flight evaluations on Ctrl+C
    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received, cancelling evaluations");
            watcher.cancel();
        }
    });

    let outcomes = chain.evaluate_batch(&transactions, &cancel).await;

    for outcome in &outcomes {
        match outcome.executed_by() {
            Some(kind) => info!(tx_id = %outcome.tx_id, strategy = %kind, "Front-run executed"),
            None => info!(
                tx_id = %outcome.tx_id,
                halted = outcome.halted(),
                steps = outcome.records.len(),
                "No front-run"
            ),
        }
    }
    println!("{}", serde_json::to_string_pretty(&outcomes)?);

    info!(
        transactions = transactions.len(),
        submitted = venue.submitted(),
        "FRONTRUN finished"
    );
    Ok(())
}

fn load_transactions(path: &str) -> Result<Vec<Transaction>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read transaction file: {path}"))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse transaction file: {path}"))
}

fn sample_transaction() -> Transaction {
    Transaction::new(format!("0x{}", uuid::Uuid::new_v4().simple()))
        .with_token("MOCK_TOKEN")
        .with_history(vec![9.5, 9.8, 10.1, 9.9, 10.4])
        .with_payload(serde_json::json!({ "to": "0xrouter", "value": "1000000000000000000" }))
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("frontrun=info"));

    let json_logging = std::env::var("FRONTRUN_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
