//! Background cadences driving the shared aggregate.
//!
//! - the refresh loop re-derives the emission snapshot and re-pulls coin
//!   data on a short fixed interval
//! - the daily loop wakes at a fixed UTC time of day and persists the
//!   day's figures to the sink

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::economics::{format_metric, DailyFigures, Economics};
use crate::emission::EmissionSnapshot;
use crate::error::{SinkError, SourceError};
use crate::market_data::{pull_coins, CoinSource};
use crate::metrics::prometheus as m;
use crate::sink::{self, SnapshotSink};
use crate::state::market::{refresh, snapshot_view, MarketHandle};

/// Resolves once shutdown has been requested or the sender is gone.
pub async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// One refresh tick: rebuild the emission snapshot for `now`, then pull.
pub async fn refresh_once(
    handle: &MarketHandle,
    source: &dyn CoinSource,
    now: DateTime<Utc>,
) -> Result<usize, SourceError> {
    let snap = refresh(handle, now).await;
    m::record_emission(snap.day, snap.period, snap.total_release);
    pull_coins(source, handle).await
}

pub async fn run_refresh_loop(
    handle: MarketHandle,
    source: Arc<dyn CoinSource>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(interval_ms = every.as_millis() as u64, source = source.name(), "refresh loop started");

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown_requested(&mut shutdown) => break,
        }
        m::record_refresh_tick();
        // failures are already logged by the worker; keep last-known state
        if let Ok(listed) = refresh_once(&handle, source.as_ref(), Utc::now()).await {
            debug!(listed, "refresh tick complete");
        }
    }

    info!("shutdown requested, refresh loop stopping");
}

/// Next instant at which the wall clock reads `at` (UTC), at or after `now`.
pub fn next_occurrence(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if now > today {
        today + ChronoDuration::days(1)
    } else {
        today
    }
}

/// Write the five daily entries for `date`. Stops at the first failure.
pub async fn persist_figures(
    sink: &dyn SnapshotSink,
    date: &str,
    figures: &DailyFigures,
) -> Result<(), SinkError> {
    let entries = [
        (sink::TOTAL_AMOUNT, format!("{:.4}", figures.total_amount)),
        (sink::TOTAL_RELEASE, format!("{:.4}", figures.total_release)),
        (sink::DT_HIGH, format_metric(&figures.high_cost)),
        (sink::DT_LOW, format_metric(&figures.low_cost)),
        (sink::DT_BONUS, format_metric(&figures.bonus)),
    ];
    for (prefix, value) in entries {
        sink.set(&sink::key(prefix, date), value).await?;
    }
    Ok(())
}

/// Refresh, pull, compute and persist the figures for the day `target`
/// falls on.
pub async fn daily_cycle(
    handle: &MarketHandle,
    source: &dyn CoinSource,
    sink: &dyn SnapshotSink,
    economics: &Economics,
    target: DateTime<Utc>,
) -> Result<DailyFigures, SinkError> {
    info!(%target, "collecting daily figures");
    if let Err(err) = refresh_once(handle, source, Utc::now()).await {
        warn!(error = %err, "pull failed, persisting last known market");
    }

    let view = snapshot_view(handle).await;
    let snap: EmissionSnapshot = view.snapshot();
    let figures = DailyFigures::compute(&snap, view.total_volume_in_fiat(), economics);

    let date = sink::date_of(target);
    info!(
        %date,
        day = snap.day,
        period = snap.period,
        total_amount = figures.total_amount,
        total_release = figures.total_release,
        "writing daily figures"
    );
    persist_figures(sink, &date, &figures).await?;
    info!(%date, "daily figures written");
    Ok(figures)
}

pub async fn run_daily_loop(
    handle: MarketHandle,
    source: Arc<dyn CoinSource>,
    sink: Arc<dyn SnapshotSink>,
    economics: Economics,
    at: NaiveTime,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(%at, "daily snapshot loop started");
    let mut last_fired: Option<DateTime<Utc>> = None;

    loop {
        let now = Utc::now();
        let mut target = next_occurrence(now, at);
        // an early wakeup must not fire the same slot twice
        if last_fired.is_some_and(|last| target <= last) {
            target += ChronoDuration::days(1);
        }
        let wait = (target - now).to_std().unwrap_or(Duration::ZERO);
        debug!(%target, wait_secs = wait.as_secs(), "sleeping until next snapshot");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown_requested(&mut shutdown) => break,
        }

        match daily_cycle(&handle, source.as_ref(), sink.as_ref(), &economics, target).await {
            Ok(_) => m::record_snapshot_write(),
            Err(err) => {
                m::record_snapshot_failure();
                error!(%target, error = %err, "failed to persist daily figures");
            }
        }
        last_fired = Some(target);
    }

    info!("shutdown requested, daily snapshot loop stopping");
}
