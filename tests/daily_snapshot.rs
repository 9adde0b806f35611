use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::Arc;

use dt_tracker::economics::{Economics, UNDEFINED};
use dt_tracker::emission::EmissionClock;
use dt_tracker::error::SourceError;
use dt_tracker::market_data::types::{CoinListing, CoinVolume};
use dt_tracker::market_data::CoinSource;
use dt_tracker::report::stored_total_amount;
use dt_tracker::scheduler::{daily_cycle, persist_figures, refresh_once};
use dt_tracker::sink::{JsonFileSink, MemorySink, SnapshotSink};
use dt_tracker::state::market::{new_handle, snapshot_view};
use dt_tracker::state::AggregateMarket;

struct TwoCoins;

#[async_trait]
impl CoinSource for TwoCoins {
    fn name(&self) -> &'static str {
        "two-coins"
    }

    async fn fetch_coin_list(&self) -> Result<Vec<CoinListing>, SourceError> {
        Ok(vec![
            CoinListing { id: 1, name: "BTC".into(), price: 10_000.0 },
            CoinListing { id: 2, name: "ETH".into(), price: 500.0 },
        ])
    }

    async fn fetch_market(&self, _ids: &[u32]) -> Result<Vec<CoinVolume>, SourceError> {
        Ok(vec![
            CoinVolume { id: 1, total_traded_volume: 5.0 },
            CoinVolume { id: 2, total_traded_volume: 20.0 },
        ])
    }
}

#[tokio::test]
async fn refresh_then_persist_round_trip() {
    let handle = new_handle(AggregateMarket::new(6.5, EmissionClock::default()));
    let source = TwoCoins;
    let now = Utc.with_ymd_and_hms(2018, 11, 5, 12, 0, 0).unwrap();

    assert_eq!(refresh_once(&handle, &source, now).await.unwrap(), 2);
    let view = snapshot_view(&handle).await;
    assert_eq!(view.total_volume_in_fiat(), 162.5);
    assert_eq!(view.snapshot().day, 370);
    assert_eq!(view.snapshot().period, 2);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dt.json");
    let sink: Arc<dyn SnapshotSink> = Arc::new(JsonFileSink::open(&path).await.unwrap());

    let target = Utc.with_ymd_and_hms(2018, 11, 5, 15, 59, 55).unwrap();
    let figures = daily_cycle(&handle, &source, sink.as_ref(), &Economics::default(), target)
        .await
        .unwrap();
    assert_eq!(figures.total_amount, 162.5);

    let reopened = JsonFileSink::open(&path).await.unwrap();
    assert_eq!(
        stored_total_amount(&reopened, target).await.unwrap(),
        Some(162.5)
    );
    assert!(reopened.get("DTBONUS_2018-11-05").await.unwrap().is_some());
}

#[tokio::test]
async fn startup_state_persists_sentinels() {
    let handle = new_handle(AggregateMarket::new(6.5, EmissionClock::default()));
    let view = snapshot_view(&handle).await;
    let figures = dt_tracker::economics::DailyFigures::compute(
        &view.snapshot(),
        view.total_volume_in_fiat(),
        &Economics::default(),
    );

    let sink = MemorySink::new();
    persist_figures(&sink, "2017-11-01", &figures).await.unwrap();

    assert_eq!(sink.get("TOTALAMOUNT_2017-11-01").await.unwrap().as_deref(), Some("0.0000"));
    assert_eq!(sink.get("DTHIGH_2017-11-01").await.unwrap().as_deref(), Some(UNDEFINED));
    assert_eq!(sink.get("DTLOW_2017-11-01").await.unwrap().as_deref(), Some(UNDEFINED));
    assert_eq!(sink.get("DTBONUS_2017-11-01").await.unwrap().as_deref(), Some(UNDEFINED));
}
