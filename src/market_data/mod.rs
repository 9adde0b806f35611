pub mod adapters;
pub mod market_worker;
pub mod traits;
pub mod types;

pub use market_worker::pull_coins;
pub use traits::CoinSource;
