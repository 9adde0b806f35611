use std::time::Instant;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::market_data::traits::CoinSource;
use crate::metrics::prometheus as m;
use crate::state::market::{upsert_all, MarketHandle};
use crate::state::CoinRecord;

/// Pull listings, then volumes, and merge both into the aggregate.
///
/// A failed list fetch leaves the aggregate untouched. A failed market fetch
/// keeps the freshly merged listings and leaves every volume as it was.
/// Returns the number of coins listed.
pub async fn pull_coins(source: &dyn CoinSource, handle: &MarketHandle) -> Result<usize, SourceError> {
    let started = Instant::now();
    let listings = source.fetch_coin_list().await.inspect_err(|err| {
        warn!(source = source.name(), error = %err, "coin list fetch failed");
        m::record_source_failure(source.name(), "coin_list");
    })?;
    m::record_fetch_latency(source.name(), "coin_list", started.elapsed().as_secs_f64() * 1e3);

    let ids: Vec<u32> = listings.iter().map(|l| l.id).collect();
    let listed = ids.len();
    upsert_all(handle, listings.into_iter().map(CoinRecord::from)).await;
    m::record_coins_upserted(listed);

    if ids.is_empty() {
        debug!(source = source.name(), "coin list empty, skipping market fetch");
        return Ok(0);
    }

    let started = Instant::now();
    let volumes = source.fetch_market(&ids).await.inspect_err(|err| {
        warn!(source = source.name(), error = %err, "market fetch failed");
        m::record_source_failure(source.name(), "market");
    })?;
    m::record_fetch_latency(source.name(), "market", started.elapsed().as_secs_f64() * 1e3);

    debug!(source = source.name(), listed, volumes = volumes.len(), "merging volumes");
    upsert_all(handle, volumes.into_iter().map(CoinRecord::from)).await;

    Ok(listed)
}
