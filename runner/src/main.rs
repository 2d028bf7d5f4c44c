use anyhow::{Context, Result};
use pairtrade_rs::backtest::{BacktestReport, BacktestSession};
use pairtrade_rs::engine::UpdateOutcome;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod stream;

use config::RunnerConfig;
use stream::TickStreamer;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = RunnerConfig::from_env()?;
    init_tracing(config.json_logs);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        git_branch = env!("GIT_BRANCH"),
        "Starting pairtrade runner..."
    );

    // Paper execution: every order fills at the synchronized prices
    let mut session = BacktestSession::new(config.initial_balance, config.engine, config.risk)
        .context("Invalid pairs engine configuration")?;

    let (streamer, mut tick_rx) = TickStreamer::from_file(&config.ticks_file);

    while let Some(tick) = tick_rx.recv().await {
        match session.on_tick(&tick) {
            Ok(Some(UpdateOutcome::Evaluated {
                transition: Some(transition),
                ..
            })) => {
                info!(
                    at = %tick.timestamp,
                    from = %transition.from,
                    to = %transition.to,
                    z_score = transition.z_score,
                    reason = ?transition.reason,
                    "Spread state changed"
                );
            }
            Ok(_) => {}
            Err(err) => {
                error!(
                    error = ?err,
                    signal = %session.engine().signal(),
                    "Tick processing failed"
                );
            }
        }
    }

    let streamed = streamer.finish().await?;
    let engine = session.engine();
    info!(
        ticks = streamed,
        pairs = engine.synchronizer().pairs_emitted(),
        signal = %engine.signal(),
        realized_pnl = engine.position().realized_pnl(),
        "Stream finished"
    );

    let report = BacktestReport::new(session.finish());

    println!("{}", report.format());
    if config.json_logs {
        println!("{}", report.to_json()?);
    }

    Ok(())
}
