use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::error::SourceError;
use crate::market_data::traits::CoinSource;
use crate::market_data::types::{CoinListing, CoinVolume};

pub const DEFAULT_API_BASE: &str = "https://a.dragonex.io";

const COIN_LIST_PATH: &str = "/coin/list/";
const MARKET_PATH: &str = "/market/real/";

/// DragonEx reports `total_amount` for one side of the book only.
const VOLUME_SIDES: f64 = 2.0;

/// REST client for the DragonEx public market endpoints.
pub struct DragonexSource {
    client: reqwest::Client,
    base_url: String,
}

impl DragonexSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<String, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        let body = self
            .client
            .get(&url)
            .query(query)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(%url, bytes = body.len(), "dragonex response");
        Ok(body)
    }
}

#[async_trait]
impl CoinSource for DragonexSource {
    fn name(&self) -> &'static str {
        "dragonex"
    }

    async fn fetch_coin_list(&self) -> Result<Vec<CoinListing>, SourceError> {
        let body = self.get(COIN_LIST_PATH, &[]).await?;
        parse_coin_list(&body)
    }

    async fn fetch_market(&self, ids: &[u32]) -> Result<Vec<CoinVolume>, SourceError> {
        let coin_ids = ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        // cache buster
        let time = Utc::now().timestamp_nanos_opt().unwrap_or_default().to_string();
        let body = self
            .get(MARKET_PATH, &[("coin_ids", coin_ids), ("time", time)])
            .await?;
        parse_market(&body)
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    ok: bool,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct RawListing {
    code: String,
    #[serde(deserialize_with = "lenient")]
    coin_id: u32,
    #[serde(deserialize_with = "lenient")]
    price: f64,
}

#[derive(Deserialize)]
struct RawMarket {
    #[serde(deserialize_with = "lenient")]
    coin_id: u32,
    #[serde(deserialize_with = "lenient")]
    total_amount: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StrOr<T> {
    Str(String),
    Val(T),
}

/// DragonEx quotes most numbers as strings.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match StrOr::<T>::deserialize(deserializer)? {
        StrOr::Val(v) => Ok(v),
        StrOr::Str(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

fn open<T: for<'de> Deserialize<'de>>(body: &str) -> Result<Option<T>, SourceError> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;
    if !envelope.ok {
        return Err(SourceError::Rejected(envelope.msg));
    }
    Ok(envelope.data)
}

pub fn parse_coin_list(body: &str) -> Result<Vec<CoinListing>, SourceError> {
    let data: Vec<RawListing> = open(body)?.unwrap_or_default();
    Ok(data
        .into_iter()
        .map(|raw| CoinListing {
            id: raw.coin_id,
            name: raw.code.to_uppercase(),
            price: raw.price,
        })
        .collect())
}

pub fn parse_market(body: &str) -> Result<Vec<CoinVolume>, SourceError> {
    let data: Vec<RawMarket> = open(body)?.unwrap_or_default();
    Ok(data
        .into_iter()
        .map(|raw| CoinVolume {
            id: raw.coin_id,
            total_traded_volume: raw.total_amount * VOLUME_SIDES,
        })
        .collect())
}
