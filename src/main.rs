//! AOTS: Automated moving-average tier scanner
//!
//! Entry point. Loads configuration, initialises structured logging,
//! resolves secrets, loads the symbol universe, starts the liveness
//! server and runs the scan→pack→publish loop with graceful shutdown.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

use aots::config::{self, DataSourceSecrets};
use aots::engine::cycle::ScanCycle;
use aots::engine::report::ReportSettings;
use aots::engine::scanner::Scanner;
use aots::engine::scheduler::Scheduler;
use aots::health;
use aots::market::binance::BinanceClient;
use aots::market::coingecko::CoinGeckoClient;
use aots::market::{CandleSource, SymbolUniverse};
use aots::notify::discord::DiscordClient;

const BANNER: &str = r#"
    _    ___ _____ ____
   / \  / _ \_   _/ ___|
  / _ \| | | || | \___ \
 / ___ \ |_| || |  ___) |
/_/   \_\___/ |_| |____/

  Ascending moving-average Tier Scanner
  v0.1.0
"#;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("AOTS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        config = %config_path,
        provider = ?cfg.data_source.provider,
        windows = ?cfg.scanner.windows,
        timeframe = %cfg.scanner.timeframe,
        scan_interval_secs = cfg.scanner.scan_interval_secs,
        request_delay_ms = cfg.request_delay().as_millis() as u64,
        "AOTS starting up"
    );

    // -- Secrets and clients ---------------------------------------------

    let secrets = cfg.resolve_secrets()?;

    let (universe_source, candle_source): (Arc<dyn SymbolUniverse>, Arc<dyn CandleSource>) =
        match secrets.data_source {
            DataSourceSecrets::Binance { api_key, api_secret } => {
                let client = Arc::new(BinanceClient::new(
                    api_key,
                    api_secret,
                    &cfg.data_source.quote_asset,
                    &cfg.scanner.timeframe,
                    cfg.scanner.candle_limit,
                )?);
                if let Err(e) = client.verify_credentials().await {
                    warn!(error = format!("{e:#}"), "Binance credential check failed, scanning public endpoints anyway");
                }
                (
                    client.clone() as Arc<dyn SymbolUniverse>,
                    client as Arc<dyn CandleSource>,
                )
            }
            DataSourceSecrets::CoinGecko { api_key } => {
                let gecko = &cfg.data_source.coingecko;
                let client = Arc::new(CoinGeckoClient::new(
                    api_key,
                    &gecko.vs_currency,
                    gecko.universe_size,
                    cfg.scanner.candle_limit,
                )?);
                (
                    client.clone() as Arc<dyn SymbolUniverse>,
                    client as Arc<dyn CandleSource>,
                )
            }
        };

    let publisher = Arc::new(DiscordClient::new(
        secrets.discord_token,
        secrets.discord_channel_id,
    )?);

    // -- Universe (loaded once; fatal on failure) ------------------------

    let universe = universe_source
        .load_universe()
        .await
        .context("Failed to load symbol universe")?;
    if universe.is_empty() {
        anyhow::bail!("Symbol universe is empty; nothing to scan");
    }
    info!(symbols = universe.len(), "Symbol universe loaded");

    // -- Liveness server -------------------------------------------------

    let health_server = health::spawn_health_server(cfg.health_port()?).await?;

    // -- Scan loop -------------------------------------------------------

    let report_settings =
        ReportSettings::from_config(&cfg.report, cfg.report_description(), cfg.timezone()?);
    let cycle = ScanCycle::new(
        universe,
        candle_source,
        publisher,
        Scanner::new(cfg.scanner.windows, cfg.request_delay()),
        report_settings,
    );

    let cycles = Scheduler::new(Arc::new(cycle), cfg.scan_interval())
        .run(shutdown_signal())
        .await;

    health_server.abort();
    info!(cycles, "AOTS shut down cleanly.");

    Ok(())
}

/// Resolves on Ctrl+C.
///
/// The signal is watched from its own task so that a Ctrl+C arriving
/// mid-cycle is remembered until the scheduler next checks.
fn shutdown_signal() -> impl std::future::Future<Output = ()> {
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(());
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for shutdown signal");
                // Dropping the sender would read as a shutdown.
                let _tx = tx;
                std::future::pending::<()>().await
            }
        }
    });
    async move {
        let _ = rx.await;
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("aots=info,tower_http=warn"));

    let json_logging = std::env::var("AOTS_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
