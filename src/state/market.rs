use crate::emission::{EmissionClock, EmissionSnapshot};
use crate::state::coin::CoinRecord;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// The exchange-wide aggregate: every coin seen so far plus the current
/// emission snapshot.
///
/// All mutation goes through [`AggregateMarket::upsert_coin`] and
/// [`AggregateMarket::refresh_snapshot`].
#[derive(Clone, Debug)]
pub struct AggregateMarket {
    exchange_rate: f64,
    coins: Vec<CoinRecord>,
    snapshot: EmissionSnapshot,
    clock: EmissionClock,
}

impl AggregateMarket {
    pub fn new(exchange_rate: f64, clock: EmissionClock) -> Self {
        AggregateMarket {
            exchange_rate,
            coins: Vec::new(),
            snapshot: EmissionSnapshot::default(),
            clock,
        }
    }

    /// Merge `partial` into the record with the same id, or append it.
    /// Linear scan; the exchange lists a few hundred coins at most.
    pub fn upsert_coin(&mut self, partial: CoinRecord) {
        match self.coins.iter_mut().find(|c| c.id == partial.id) {
            Some(existing) => existing.merge(&partial),
            None => self.coins.push(partial),
        }
    }

    pub fn refresh_snapshot(&mut self, now: DateTime<Utc>) {
        self.snapshot = self.clock.snapshot(now);
    }

    /// Summed 24h volume in USD.
    pub fn total_volume(&self) -> f64 {
        // fold from +0.0; float `sum` starts at -0.0
        self.coins.iter().fold(0.0, |acc, c| acc + c.volume)
    }

    /// Summed 24h volume converted with the configured exchange rate.
    pub fn total_volume_in_fiat(&self) -> f64 {
        self.total_volume() * self.exchange_rate
    }

    pub fn coins(&self) -> &[CoinRecord] {
        &self.coins
    }

    pub fn coin(&self, id: u32) -> Option<&CoinRecord> {
        self.coins.iter().find(|c| c.id == id)
    }

    pub fn snapshot(&self) -> EmissionSnapshot {
        self.snapshot
    }

    pub fn exchange_rate(&self) -> f64 {
        self.exchange_rate
    }

    pub fn clock(&self) -> &EmissionClock {
        &self.clock
    }
}

/// Shared owner of the aggregate. Every loop goes through this handle.
pub type MarketHandle = Arc<RwLock<AggregateMarket>>;

pub fn new_handle(market: AggregateMarket) -> MarketHandle {
    Arc::new(RwLock::new(market))
}

/// Apply a batch under one write lock so readers never observe half of it.
pub async fn upsert_all(handle: &MarketHandle, coins: impl IntoIterator<Item = CoinRecord>) {
    let mut market = handle.write().await;
    for coin in coins {
        market.upsert_coin(coin);
    }
}

pub async fn refresh(handle: &MarketHandle, now: DateTime<Utc>) -> EmissionSnapshot {
    let mut market = handle.write().await;
    market.refresh_snapshot(now);
    market.snapshot()
}

/// Consistent point-in-time copy for readers.
pub async fn snapshot_view(handle: &MarketHandle) -> AggregateMarket {
    handle.read().await.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn market() -> AggregateMarket {
        AggregateMarket::new(6.5, EmissionClock::default())
    }

    fn btc() -> CoinRecord {
        CoinRecord {
            id: 1,
            name: "BTC".into(),
            price: 10_000.0,
            volume: 5.0,
        }
    }

    fn eth() -> CoinRecord {
        CoinRecord {
            id: 2,
            name: "ETH".into(),
            price: 500.0,
            volume: 20.0,
        }
    }

    #[test]
    fn empty_market_has_zero_fiat_volume() {
        let total = market().total_volume_in_fiat();
        assert_eq!(total, 0.0);
        assert!(total.is_sign_positive());
        assert_eq!(format!("{total:.4}"), "0.0000");
    }

    #[test]
    fn fiat_volume_uses_exchange_rate() {
        let mut m = market();
        m.upsert_coin(btc());
        m.upsert_coin(eth());
        assert_eq!(m.total_volume_in_fiat(), 162.5);
    }

    #[test]
    fn upsert_is_idempotent() {
        let mut once = market();
        once.upsert_coin(btc());

        let mut twice = market();
        twice.upsert_coin(btc());
        twice.upsert_coin(btc());

        assert_eq!(once.coins(), twice.coins());
        assert_eq!(twice.coins().len(), 1);
    }

    #[test]
    fn upsert_merges_instead_of_replacing() {
        let mut m = market();
        m.upsert_coin(btc());
        m.upsert_coin(CoinRecord::volume(1, 0.0));
        m.upsert_coin(CoinRecord::volume(1, 9.0));

        let coin = m.coin(1).unwrap();
        assert_eq!(coin.name, "BTC");
        assert_eq!(coin.price, 10_000.0);
        assert_eq!(coin.volume, 9.0);
        assert_eq!(m.coins().len(), 1);
    }

    #[test]
    fn refresh_replaces_snapshot() {
        let mut m = market();
        assert_eq!(m.snapshot(), EmissionSnapshot::default());

        let now = Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap();
        m.refresh_snapshot(now);
        assert_eq!(m.snapshot(), m.clock().snapshot(now));
        assert!(m.snapshot().day >= 1);
    }

    #[test]
    fn refresh_before_epoch_leaves_figures_undefined() {
        use crate::economics::{DailyFigures, Economics};
        use crate::emission::{DEFAULT_BASE_RELEASE, DEFAULT_DAMPING, DEFAULT_PERIOD_DAYS};

        let epoch = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let clock =
            EmissionClock::new(epoch, DEFAULT_BASE_RELEASE, DEFAULT_DAMPING, DEFAULT_PERIOD_DAYS);
        let mut m = AggregateMarket::new(6.5, clock);
        m.upsert_coin(btc());
        m.refresh_snapshot(Utc.with_ymd_and_hms(2029, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(m.snapshot(), EmissionSnapshot::default());

        let f = DailyFigures::compute(&m.snapshot(), m.total_volume_in_fiat(), &Economics::default());
        assert!(f.high_cost.is_err());
        assert!(f.low_cost.is_err());
        assert!(f.bonus.is_err());
    }

    #[tokio::test]
    async fn handle_batches_are_visible_together() {
        let handle = new_handle(market());
        upsert_all(&handle, vec![btc(), eth()]).await;
        upsert_all(&handle, [CoinRecord::volume(2, 40.0)]).await;

        let view = snapshot_view(&handle).await;
        assert_eq!(view.coins().len(), 2);
        assert_eq!(view.total_volume(), 45.0);
    }
}
