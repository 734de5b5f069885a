//! Daily price history for the trend graphs
//!
//! Fetches `/coins/{id}/market_chart` once per coin. Coins that fail are left
//! out; when every coin fails the last persisted history is used instead.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{CoinGeckoClient, CoinId, CoinSet, FetchError, HistorySample, PriceHistory};
use crate::cache::CacheManager;

/// Store key for the persisted history
const HISTORY_CACHE_KEY: &str = "price_history";

/// Response of the market chart endpoint
#[derive(Debug, Deserialize)]
struct MarketChart {
    /// `[timestamp_ms, price]` pairs
    prices: Vec<(i64, f64)>,
}

/// Client for fetching per-coin price history
#[derive(Debug, Clone)]
pub struct HistoryClient {
    api: CoinGeckoClient,
    store: Option<CacheManager>,
    fallback_max_age: Duration,
}

impl HistoryClient {
    pub fn new(api: CoinGeckoClient) -> Self {
        Self {
            api,
            store: None,
            fallback_max_age: Duration::hours(24),
        }
    }

    /// Persists successful results and falls back to them for up to `max_age`
    pub fn with_store(mut self, store: CacheManager, max_age: Duration) -> Self {
        self.store = Some(store);
        self.fallback_max_age = max_age;
        self
    }

    /// Fetches `days` of daily prices for every coin in the set
    ///
    /// # Returns
    /// * `Some(history)` with the coins that could be fetched
    /// * the persisted history if no coin could be fetched and it is recent enough
    /// * `None` if there is nothing to show
    pub async fn fetch_history(&self, coins: &CoinSet, days: u32) -> Option<PriceHistory> {
        let mut history = PriceHistory::new();

        for coin in coins.iter() {
            match self.fetch_coin(coin, days).await {
                Ok(samples) => {
                    history.insert(coin.clone(), samples);
                }
                Err(e) => {
                    warn!(coin = %coin, error = %e, "skipping price history");
                }
            }
        }

        if !history.is_empty() {
            if let Some(ref store) = self.store {
                if let Err(e) = store.write(HISTORY_CACHE_KEY, &history, self.fallback_max_age) {
                    warn!(error = %e, "failed to persist price history");
                }
            }
            return Some(history);
        }

        let store = self.store.as_ref()?;
        match store.read::<PriceHistory>(HISTORY_CACHE_KEY) {
            Some(cached) if !cached.is_expired => {
                debug!(cached_at = %cached.cached_at, "using persisted price history");
                Some(cached.data)
            }
            _ => None,
        }
    }

    async fn fetch_coin(&self, coin: &CoinId, days: u32) -> Result<Vec<HistorySample>, FetchError> {
        let query = [
            ("vs_currency", self.api.vs_currency().to_string()),
            ("days", days.to_string()),
            ("interval", "daily".to_string()),
        ];
        let path = format!("/coins/{}/market_chart", coin);

        let chart: MarketChart = self.api.get_json(&path, &query).await?;
        Ok(to_samples(chart.prices))
    }
}

/// Converts `[timestamp_ms, price]` pairs into samples, dropping bad timestamps
fn to_samples(points: Vec<(i64, f64)>) -> Vec<HistorySample> {
    points
        .into_iter()
        .filter_map(|(ms, price)| {
            DateTime::<Utc>::from_timestamp_millis(ms).map(|at| HistorySample { at, price })
        })
        .collect()
}
