use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::filter::EnvFilter;

use dt_tracker::config::Config;
use dt_tracker::market_data::adapters::DragonexSource;
use dt_tracker::market_data::CoinSource;
use dt_tracker::metrics::init_metrics_server;
use dt_tracker::report::run_report_loop;
use dt_tracker::scheduler::{refresh_once, run_daily_loop, run_refresh_loop};
use dt_tracker::sink::{JsonFileSink, MemorySink, SnapshotSink};
use dt_tracker::state::market::new_handle;
use dt_tracker::state::AggregateMarket;

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    if let Some(addr) = config.metrics_addr {
        init_metrics_server(addr)?;
        info!(%addr, "prometheus exporter listening");
    }

    info!(
        exchange_rate = config.exchange_rate,
        snapshot_time = %config.snapshot_time,
        epoch = %config.epoch,
        "dt-tracker starting"
    );

    let economics = config.economics();
    let handle = new_handle(AggregateMarket::new(config.exchange_rate, config.clock()));
    let source: Arc<dyn CoinSource> =
        Arc::new(DragonexSource::new(config.api_base.clone(), config.http_timeout)?);
    let sink: Arc<dyn SnapshotSink> = match &config.sink_path {
        Some(path) => Arc::new(JsonFileSink::open(path).await?),
        None => {
            warn!("DT_SINK_PATH not set, daily figures are kept in memory only");
            Arc::new(MemorySink::new())
        }
    };

    info!("initial market pull");
    match refresh_once(&handle, source.as_ref(), Utc::now()).await {
        Ok(listed) => info!(listed, "initial market pull complete"),
        Err(err) => warn!(error = %err, "initial market pull failed, continuing"),
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let tasks = vec![
        (
            "refresh",
            tokio::spawn(run_refresh_loop(
                handle.clone(),
                source.clone(),
                config.refresh_interval,
                shutdown_rx.clone(),
            )),
        ),
        (
            "daily snapshot",
            tokio::spawn(run_daily_loop(
                handle.clone(),
                source.clone(),
                sink.clone(),
                economics,
                config.snapshot_time,
                shutdown_rx.clone(),
            )),
        ),
        (
            "report",
            tokio::spawn(run_report_loop(
                handle.clone(),
                sink.clone(),
                economics,
                config.report_interval,
                shutdown_rx,
            )),
        ),
    ];

    tokio::signal::ctrl_c().await?;
    info!("received Ctrl-C, shutting down");
    shutdown_tx.send(true).ok();

    let (names, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
    for (name, res) in names.into_iter().zip(futures::future::join_all(handles).await) {
        match res {
            Ok(()) => info!(task = name, "task stopped"),
            Err(err) => warn!(task = name, error = %err, "task panicked"),
        }
    }

    Ok(())
}
