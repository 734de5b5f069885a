//! CoinGecko market price client
//!
//! This module provides the `PriceFetcher` seam used by the price cache, and
//! `CoinGeckoClient`, which implements it against the CoinGecko
//! `/coins/markets` endpoint.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::{CoinId, CoinSet, PriceMap, PricePoint};
use crate::settings::ApiSettings;

/// Header carrying the key for the CoinGecko Pro API
const API_KEY_HEADER: &str = "x-cg-pro-api-key";

/// Errors that can occur when fetching prices
///
/// Every variant is recoverable: the price cache answers them with the last
/// known-good data when it has any.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network unreachable, timeout or other transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API returned status {0}")]
    Status(StatusCode),

    /// The response body was not the expected JSON
    #[error("Failed to parse API response: {0}")]
    Parse(#[from] serde_json::Error),

    /// A requested coin was absent from the response
    #[error("No data returned for coin '{0}'")]
    MissingCoin(CoinId),

    /// A requested coin came back without a current price
    #[error("No current price returned for coin '{0}'")]
    MissingPrice(CoinId),
}

/// Fetches current prices for a set of coins in a single request
///
/// A fetch either returns a price for every requested coin or fails as a whole.
pub trait PriceFetcher {
    fn fetch(&self, coins: &CoinSet) -> impl Future<Output = Result<PriceMap, FetchError>>;
}

/// One entry of the `/coins/markets` response
#[derive(Debug, Deserialize)]
struct MarketEntry {
    id: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    current_price: Option<Decimal>,
    #[serde(default)]
    price_change_percentage_24h: Option<Decimal>,
    #[serde(default)]
    market_cap: Option<Decimal>,
    #[serde(default)]
    total_volume: Option<Decimal>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

/// Client for the CoinGecko REST API
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http_client: Client,
    base_url: String,
    vs_currency: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    /// Creates a client from API settings, quoting prices in `vs_currency`
    ///
    /// The configured timeout bounds every request made by this client.
    pub fn new(api: &ApiSettings, vs_currency: &str) -> Result<Self, FetchError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(api.timeout))
            .build()?;

        Ok(Self {
            http_client,
            base_url: api.endpoint.trim_end_matches('/').to_string(),
            vs_currency: vs_currency.to_lowercase(),
            api_key: api.api_key.clone(),
        })
    }

    /// Creates a client with default settings against a custom base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            vs_currency: "usd".to_string(),
            api_key: None,
        }
    }

    pub fn vs_currency(&self) -> &str {
        &self.vs_currency
    }

    /// Issues a GET against `path` and decodes the JSON body
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "requesting");

        let mut request = self.http_client.get(&url).query(query);
        if let Some(ref key) = self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl PriceFetcher for CoinGeckoClient {
    async fn fetch(&self, coins: &CoinSet) -> Result<PriceMap, FetchError> {
        let query = [
            ("vs_currency", self.vs_currency.clone()),
            ("ids", coins.ids_param()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", "250".to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "24h".to_string()),
        ];

        let entries: Vec<MarketEntry> = self.get_json("/coins/markets", &query).await?;
        parse_markets(entries, coins, Utc::now())
    }
}

/// Converts market entries into a price map covering exactly `coins`
///
/// Entries for coins that were not requested are dropped. A requested coin that
/// is missing, or has no current price, fails the whole batch.
fn parse_markets(
    entries: Vec<MarketEntry>,
    coins: &CoinSet,
    fetched_at: DateTime<Utc>,
) -> Result<PriceMap, FetchError> {
    let mut prices = PriceMap::new();

    for entry in entries {
        let coin = match CoinId::new(&entry.id) {
            Ok(coin) if coins.contains(&coin) => coin,
            Ok(_) => continue,
            Err(_) => {
                warn!(id = %entry.id, "skipping market entry with unusable id");
                continue;
            }
        };

        let price = entry
            .current_price
            .ok_or_else(|| FetchError::MissingPrice(coin.clone()))?;

        prices.insert(
            coin.clone(),
            PricePoint {
                coin,
                symbol: entry.symbol,
                name: entry.name,
                price,
                change_24h: entry.price_change_percentage_24h,
                market_cap: entry.market_cap,
                volume: entry.total_volume,
                observed_at: entry.last_updated.unwrap_or(fetched_at),
            },
        );
    }

    if let Some(missing) = coins.iter().find(|coin| !prices.contains_key(*coin)) {
        return Err(FetchError::MissingCoin(missing.clone()));
    }

    Ok(prices)
}
