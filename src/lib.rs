//! DragonEx market tracker and DT emission economics.

pub mod config;
pub mod economics;
pub mod emission;
pub mod error;
pub mod market_data;
pub mod metrics;
pub mod report;
pub mod scheduler;
pub mod sink;
pub mod state;
