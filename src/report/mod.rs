//! Periodic human-readable summary of the aggregate, logged at `info`.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::economics::{format_metric, Economics};
use crate::error::SinkError;
use crate::scheduler::shutdown_requested;
use crate::sink::{self, SnapshotSink};
use crate::state::market::{snapshot_view, MarketHandle};
use crate::state::AggregateMarket;

/// Total fiat amount persisted for the Beijing date of `at`, if any.
pub async fn stored_total_amount(
    sink: &dyn SnapshotSink,
    at: DateTime<Utc>,
) -> Result<Option<f64>, SinkError> {
    let key = sink::key(sink::TOTAL_AMOUNT, &sink::date_of(at));
    Ok(sink.get(&key).await?.and_then(|v| v.parse().ok()))
}

/// Render the coin table and DT figures. `yesterday_amount` is the fiat
/// total persisted for the previous day.
pub fn render(
    market: &AggregateMarket,
    economics: &Economics,
    now: DateTime<Utc>,
    yesterday_amount: Option<f64>,
) -> String {
    let rate = market.exchange_rate();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:>10}{:>20}{:>20}{:>20}{:>20}",
        "Coin", "Price($)", "Price(¥)", "24h Amount($)", "24h Amount(¥)"
    );
    for coin in market.coins() {
        let _ = writeln!(
            out,
            "{:>10}{:>20.4}{:>20.4}{:>20.4}{:>20.4}",
            coin.name,
            coin.price,
            coin.price * rate,
            coin.volume,
            coin.volume * rate
        );
    }
    let total = market.total_volume();
    let total_fiat = market.total_volume_in_fiat();
    let _ = writeln!(
        out,
        "{:>10}{:>20.4}{:>20.4}{:>20.4}{:>20.4}",
        "Total", 0.0, 0.0, total, total_fiat
    );
    let yesterday_amount = yesterday_amount.filter(|v| *v != 0.0);
    if let Some(amount) = yesterday_amount {
        let usd = if rate == 0.0 { 0.0 } else { amount / rate };
        let _ = writeln!(
            out,
            "{:>10}{:>20.4}{:>20.4}{:>20.4}{:>20.4}",
            "Yesterday", 0.0, 0.0, usd, amount
        );
    }
    out.push_str("----------\n");

    let _ = writeln!(
        out,
        "{:>10}{:>10}{:>10}{:>15}{:>15}{:>15}{:>15}{:>15}",
        "DT:", "Day", "Period", "Today Release", "Total Release", "Cost_H(¥)", "Cost_L(¥)", "Bonus(¥)"
    );
    let snap = market.snapshot();
    let _ = writeln!(
        out,
        "{:>10}{:>10}{:>10}{:>15.4}{:>15.4}{:>15}{:>15}{:>15}",
        "today",
        snap.day,
        snap.period,
        snap.today_release,
        snap.total_release,
        format_metric(&economics.high_cost(snap.today_release, total_fiat)),
        format_metric(&economics.low_cost(snap.today_release, total_fiat)),
        format_metric(&economics.bonus(snap.total_release, total_fiat)),
    );

    if let Some(amount) = yesterday_amount {
        let prev = market.clock().snapshot(now - ChronoDuration::days(1));
        let _ = writeln!(
            out,
            "{:>10}{:>10}{:>10}{:>15.4}{:>15.4}{:>15}{:>15}{:>15}",
            "yesterday",
            prev.day,
            prev.period,
            prev.today_release,
            prev.total_release,
            format_metric(&economics.high_cost(prev.today_release, amount)),
            format_metric(&economics.low_cost(prev.today_release, amount)),
            format_metric(&economics.bonus(prev.total_release, amount)),
        );
    }
    out.push_str("==========\n");
    out
}

pub async fn run_report_loop(
    handle: MarketHandle,
    sink: Arc<dyn SnapshotSink>,
    economics: Economics,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown_requested(&mut shutdown) => break,
        }
        let now = Utc::now();
        let yesterday = match stored_total_amount(sink.as_ref(), now - ChronoDuration::days(1)).await {
            Ok(v) => v,
            Err(err) => {
                warn!(error = %err, "could not read yesterday's total");
                None
            }
        };
        let view = snapshot_view(&handle).await;
        info!(
            "dragonex.io information ({}):\n{}",
            now.with_timezone(&*sink::BEIJING).format("%Y-%m-%d %H:%M:%S"),
            render(&view, &economics, now, yesterday)
        );
    }
}
