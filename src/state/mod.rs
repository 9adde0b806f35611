pub mod coin;
pub mod market;

pub use coin::CoinRecord;
pub use market::{AggregateMarket, MarketHandle};
