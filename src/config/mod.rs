use chrono::{DateTime, NaiveTime, Utc};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::economics::{Economics, DEFAULT_HIGH_RATE, DEFAULT_LOW_RATE, DEFAULT_TAKE_RATE};
use crate::emission::{
    EmissionClock, DEFAULT_BASE_RELEASE, DEFAULT_DAMPING, DEFAULT_EPOCH, DEFAULT_PERIOD_DAYS,
};
use crate::error::ConfigError;
use crate::market_data::adapters::dragonex::DEFAULT_API_BASE;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    /// CNY per USD.
    pub exchange_rate: f64,
    /// UTC time of day at which the daily figures are persisted.
    pub snapshot_time: NaiveTime,
    pub refresh_interval: Duration,
    pub report_interval: Duration,
    pub epoch: DateTime<Utc>,
    pub base_release: f64,
    pub period_days: u32,
    pub take_rate: f64,
    pub high_rate: f64,
    pub low_rate: f64,
    pub api_base: String,
    pub http_timeout: Duration,
    /// JSON file for daily figures; in-memory when unset.
    pub sink_path: Option<PathBuf>,
    /// Prometheus listener; disabled when unset.
    pub metrics_addr: Option<SocketAddr>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // dotenvy loads .env, but doesn't override already-set env vars
        dotenvy::dotenv().ok();

        Ok(Self::from_lookup(|key| std::env::var(key).ok())?)
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let snapshot_time = match get("DT_SNAPSHOT_TIME") {
            Some(v) => NaiveTime::parse_from_str(v.trim(), "%H:%M:%S").map_err(|_| {
                ConfigError::Invalid { key: "DT_SNAPSHOT_TIME", value: v.clone() }
            })?,
            None => NaiveTime::from_hms_opt(15, 59, 55).ok_or(ConfigError::Invalid {
                key: "DT_SNAPSHOT_TIME",
                value: "15:59:55".into(),
            })?,
        };

        let epoch = match get("DT_EPOCH") {
            Some(v) => DateTime::parse_from_rfc3339(v.trim())
                .map_err(|_| ConfigError::Invalid { key: "DT_EPOCH", value: v.clone() })?
                .with_timezone(&Utc),
            None => *DEFAULT_EPOCH,
        };

        let sink_path = get("DT_SINK_PATH").map(PathBuf::from);
        let metrics_addr = get("DT_METRICS_ADDR")
            .map(|v| parse("DT_METRICS_ADDR", &v))
            .transpose()?;

        let config = Self {
            log_level: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            exchange_rate: parse_or(&get, "DT_EXCHANGE_RATE", 6.5)?,
            snapshot_time,
            refresh_interval: Duration::from_secs(parse_or(&get, "DT_REFRESH_INTERVAL_SECS", 2)?),
            report_interval: Duration::from_secs(parse_or(&get, "DT_REPORT_INTERVAL_SECS", 5)?),
            epoch,
            base_release: parse_or(&get, "DT_BASE_RELEASE", DEFAULT_BASE_RELEASE)?,
            period_days: parse_or(&get, "DT_PERIOD_DAYS", DEFAULT_PERIOD_DAYS)?,
            take_rate: parse_or(&get, "DT_TAKE_RATE", DEFAULT_TAKE_RATE)?,
            high_rate: parse_or(&get, "DT_HIGH_RATE", DEFAULT_HIGH_RATE)?,
            low_rate: parse_or(&get, "DT_LOW_RATE", DEFAULT_LOW_RATE)?,
            api_base: get("DT_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            http_timeout: Duration::from_secs(parse_or(&get, "DT_HTTP_TIMEOUT_SECS", 10)?),
            sink_path,
            metrics_addr,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &'static str, value: String| Err(ConfigError::Invalid { key, value });

        if !(self.exchange_rate.is_finite() && self.exchange_rate > 0.0) {
            return invalid("DT_EXCHANGE_RATE", self.exchange_rate.to_string());
        }
        if self.refresh_interval.is_zero() {
            return invalid("DT_REFRESH_INTERVAL_SECS", "0".into());
        }
        if self.report_interval.is_zero() {
            return invalid("DT_REPORT_INTERVAL_SECS", "0".into());
        }
        if !(self.base_release.is_finite() && self.base_release > 0.0) {
            return invalid("DT_BASE_RELEASE", self.base_release.to_string());
        }
        if !(self.take_rate.is_finite() && self.take_rate >= 0.0) {
            return invalid("DT_TAKE_RATE", self.take_rate.to_string());
        }
        if self.period_days == 0 {
            return invalid("DT_PERIOD_DAYS", "0".into());
        }
        for (key, rate) in [("DT_HIGH_RATE", self.high_rate), ("DT_LOW_RATE", self.low_rate)] {
            if !(rate.is_finite() && rate > 0.0) {
                return invalid(key, rate.to_string());
            }
        }
        Ok(())
    }

    pub fn clock(&self) -> EmissionClock {
        EmissionClock::new(self.epoch, self.base_release, DEFAULT_DAMPING, self.period_days)
    }

    pub fn economics(&self) -> Economics {
        Economics {
            take_rate: self.take_rate,
            high_rate: self.high_rate,
            low_rate: self.low_rate,
        }
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    get(key).map_or(Ok(default), |v| parse(key, &v))
}
