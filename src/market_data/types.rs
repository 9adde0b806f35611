use crate::state::CoinRecord;

/// One entry of the exchange's coin list.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinListing {
    pub id: u32,
    pub name: String,
    /// USD
    pub price: f64,
}

/// Trailing traded volume for one coin, in USD.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinVolume {
    pub id: u32,
    pub total_traded_volume: f64,
}

impl From<CoinListing> for CoinRecord {
    fn from(l: CoinListing) -> Self {
        CoinRecord::listing(l.id, l.name, l.price)
    }
}

impl From<CoinVolume> for CoinRecord {
    fn from(v: CoinVolume) -> Self {
        CoinRecord::volume(v.id, v.total_traded_volume)
    }
}
