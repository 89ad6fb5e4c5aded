//! Tradewind CLI — run the trading engine or inspect its configuration.
//!
//! Commands:
//! - `run` — start one strategy task per enabled policy and trade until
//!   interrupted (dry-run by default; a synthetic feed drives the board)
//! - `config` — print the fully resolved configuration and its run id

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tradewind_core::policy::{BreakoutPolicy, RenkoAoPolicy, SignalPolicy, TrendPolicy};
use tradewind_core::series::{CandleWindow, RenkoSeries};
use tradewind_runner::{
    AppConfig, DryRunRouter, NoopStore, NoopTelemetry, PositionLifecycle, PriceBoard, SeriesMode,
    StrategyRunner, SyntheticFeed,
};

#[derive(Parser)]
#[command(name = "tradewind", about = "Tradewind — automated trading engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine until interrupted (Ctrl-C triggers graceful shutdown).
    Run {
        /// Path to a TOML config file. Defaults are used when absent.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured market.
        #[arg(long)]
        market: Option<String>,

        /// Route real orders instead of simulating fills.
        #[arg(long, default_value_t = false)]
        live: bool,
    },
    /// Print the resolved configuration and its run id.
    Config {
        /// Path to a TOML config file. Defaults are used when absent.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Config { config } => {
            let cfg = load_config(config.as_ref())?;
            println!("run_id: {}", cfg.run_id());
            println!("{cfg:#?}");
            Ok(())
        }
        Commands::Run {
            config,
            market,
            live,
        } => {
            let mut cfg = load_config(config.as_ref())?;
            if let Some(market) = market {
                cfg.market = market;
            }
            if live {
                cfg.dry_run = false;
            }
            run(cfg).await
        }
    }
}

async fn run(cfg: AppConfig) -> Result<()> {
    if !cfg.dry_run {
        bail!("live order routing requires an exchange client; this build only ships the dry-run router");
    }

    let run_id = cfg.run_id();
    info!(run_id, market = %cfg.market, dry_run = cfg.dry_run, "engine starting");

    let board = PriceBoard::new();
    let price = Arc::new(board.clone());
    let router = Arc::new(DryRunRouter::new());
    let store = Arc::new(NoopStore);
    let telemetry = Arc::new(NoopTelemetry);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut tasks = Vec::new();
    tasks.push(tokio::spawn(
        SyntheticFeed::new(board, cfg.market.clone(), 100.0).run(shutdown_rx.clone()),
    ));

    if cfg.trend.enabled {
        let policy = Arc::new(TrendPolicy::new(cfg.trend.policy.clone()));
        let mode = SeriesMode::Candles {
            window: CandleWindow::new(cfg.trend.policy.candle_interval_secs, cfg.series_cap),
        };
        let lifecycle = PositionLifecycle::new(
            policy.name(),
            cfg.market.clone(),
            cfg.lifecycle(cfg.trend.policy.min_position_size),
            cfg.trend.risk.clone(),
            router.clone(),
            store.clone(),
            telemetry.clone(),
        );
        let runner = StrategyRunner::new(
            cfg.market.clone(),
            policy,
            mode,
            lifecycle,
            price.clone(),
            None,
            store.clone(),
            cfg.trend.poll_interval_secs,
            cfg.trend.error_delay_secs,
            shutdown_rx.clone(),
        );
        tasks.push(tokio::spawn(runner.run()));
    }

    if cfg.renko.enabled {
        let policy = Arc::new(RenkoAoPolicy::new(cfg.renko.policy.clone()));
        let mode = SeriesMode::Renko {
            series: RenkoSeries::new(
                cfg.renko.policy.brick_atr_period,
                cfg.renko.policy.brick_multiplier,
                cfg.series_cap,
            ),
        };
        let lifecycle = PositionLifecycle::new(
            policy.name(),
            cfg.market.clone(),
            cfg.lifecycle(cfg.renko.policy.min_position_size),
            cfg.renko.risk.clone(),
            router.clone(),
            store.clone(),
            telemetry.clone(),
        );
        let runner = StrategyRunner::new(
            cfg.market.clone(),
            policy,
            mode,
            lifecycle,
            price.clone(),
            None,
            store.clone(),
            cfg.renko.poll_interval_secs,
            cfg.renko.error_delay_secs,
            shutdown_rx.clone(),
        );
        tasks.push(tokio::spawn(runner.run()));
    }

    if cfg.breakout.enabled {
        let policy = Arc::new(BreakoutPolicy::new(cfg.breakout.policy.clone()));
        let mode = SeriesMode::Candles {
            window: CandleWindow::new(cfg.breakout.policy.candle_interval_secs, cfg.series_cap),
        };
        let lifecycle = PositionLifecycle::new(
            policy.name(),
            cfg.market.clone(),
            cfg.lifecycle(cfg.breakout.policy.min_position_size),
            cfg.breakout.risk.clone(),
            router.clone(),
            store.clone(),
            telemetry.clone(),
        );
        let runner = StrategyRunner::new(
            cfg.market.clone(),
            policy,
            mode,
            lifecycle,
            price.clone(),
            None,
            store.clone(),
            cfg.breakout.poll_interval_secs,
            cfg.breakout.error_delay_secs,
            shutdown_rx.clone(),
        );
        tasks.push(tokio::spawn(runner.run()));
    }

    tokio::signal::ctrl_c().await?;
    info!("interrupt received, shutting down");
    let _ = shutdown_tx.send(true);

    for task in tasks {
        let _ = task.await;
    }
    info!("engine stopped");
    Ok(())
}
