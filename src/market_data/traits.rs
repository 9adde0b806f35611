use async_trait::async_trait;

use super::types::{CoinListing, CoinVolume};
use crate::error::SourceError;

/// Where coin listings and traded volumes come from.
///
/// Implementations own their timeout and retry policy; callers treat every
/// error as "skip this tick".
#[async_trait]
pub trait CoinSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_coin_list(&self) -> Result<Vec<CoinListing>, SourceError>;

    async fn fetch_market(&self, ids: &[u32]) -> Result<Vec<CoinVolume>, SourceError>;
}
