//! Durable storage for the daily DT figures.
//!
//! Entries are plain strings keyed by `UPPER(prefix + "_" + YYYY-MM-DD)`,
//! where the date is taken in Beijing time (UTC+8).

pub mod json_file;
pub mod memory;
pub mod traits;

pub use json_file::JsonFileSink;
pub use memory::MemorySink;
pub use traits::SnapshotSink;

use chrono::{DateTime, FixedOffset, Utc};
use once_cell::sync::Lazy;

pub const TOTAL_AMOUNT: &str = "totalamount";
pub const TOTAL_RELEASE: &str = "totalrelease";
pub const DT_HIGH: &str = "dthigh";
pub const DT_LOW: &str = "dtlow";
pub const DT_BONUS: &str = "dtbonus";

pub static BEIJING: Lazy<FixedOffset> =
    Lazy::new(|| FixedOffset::east_opt(8 * 3600).expect("UTC+8 is a valid offset"));

pub fn key(prefix: &str, date: &str) -> String {
    format!("{prefix}_{date}").to_uppercase()
}

/// Calendar date of `at` in Beijing time, `YYYY-MM-DD`.
pub fn date_of(at: DateTime<Utc>) -> String {
    at.with_timezone(&*BEIJING).format("%Y-%m-%d").to_string()
}
