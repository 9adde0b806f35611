use serde::Serialize;

/// Latest known figures for one listed coin.
///
/// Partial updates arrive from two endpoints: the coin list carries
/// id/name/price, the market endpoint carries id/volume. Zero and empty
/// fields mean "not present in this update".
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CoinRecord {
    pub id: u32,
    pub name: String,
    /// Unit price in USD.
    pub price: f64,
    /// Trailing 24h traded volume in USD.
    pub volume: f64,
}

impl CoinRecord {
    pub fn listing(id: u32, name: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: name.into().to_uppercase(),
            price,
            volume: 0.0,
        }
    }

    pub fn volume(id: u32, volume: f64) -> Self {
        Self {
            id,
            volume,
            ..Default::default()
        }
    }

    /// Copy over only the fields present in `src`.
    pub fn merge(&mut self, src: &CoinRecord) {
        if src.id != 0 {
            self.id = src.id;
        }
        if !src.name.is_empty() {
            self.name.clone_from(&src.name);
        }
        if src.price > 0.0 {
            self.price = src.price;
        }
        if src.volume > 0.0 {
            self.volume = src.volume;
        }
    }
}
