//! Core data models for coinprice
//!
//! This module contains the types shared by the price fetcher, the cache and the
//! presentation layer: validated coin identifiers, price observations and price
//! history samples.

pub mod history;
pub mod prices;

pub use history::HistoryClient;
pub use prices::{CoinGeckoClient, FetchError, PriceFetcher};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum accepted length of a coin identifier
const MAX_COIN_ID_LEN: usize = 64;

/// Coins shown when none are configured
pub const DEFAULT_COINS: [&str; 4] = ["bitcoin", "ethereum", "binancecoin", "solana"];

/// Errors raised while validating coin identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoinIdError {
    /// The identifier is empty, too long or contains unsupported characters
    #[error("Invalid coin identifier: '{0}'. Use lowercase letters, digits and '-'")]
    InvalidCoinId(String),

    /// A coin set must name at least one coin
    #[error("At least one coin identifier is required")]
    EmptyCoinSet,
}

/// API-specific slug naming a tracked cryptocurrency (e.g. `bitcoin`)
///
/// Input is trimmed and lowercased before validation, so `" Bitcoin "` and
/// `"bitcoin"` name the same coin.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CoinId(String);

impl CoinId {
    pub fn new(raw: &str) -> Result<Self, CoinIdError> {
        let id = raw.trim().to_lowercase();
        let valid = !id.is_empty()
            && id.len() <= MAX_COIN_ID_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

        if valid {
            Ok(Self(id))
        } else {
            Err(CoinIdError::InvalidCoinId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CoinId {
    type Err = CoinIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CoinId {
    type Error = CoinIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CoinId> for String {
    fn from(id: CoinId) -> Self {
        id.0
    }
}

/// Non-empty, ordered and de-duplicated set of coins requested together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CoinId>", into = "Vec<CoinId>")]
pub struct CoinSet(BTreeSet<CoinId>);

impl CoinSet {
    /// Builds a set from already validated identifiers
    pub fn new(ids: impl IntoIterator<Item = CoinId>) -> Result<Self, CoinIdError> {
        let set: BTreeSet<CoinId> = ids.into_iter().collect();
        if set.is_empty() {
            return Err(CoinIdError::EmptyCoinSet);
        }
        Ok(Self(set))
    }

    /// Validates and collects raw identifiers, failing on the first invalid one
    pub fn parse<S: AsRef<str>>(raw: impl IntoIterator<Item = S>) -> Result<Self, CoinIdError> {
        let ids = raw
            .into_iter()
            .map(|s| CoinId::new(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(ids)
    }

    pub fn contains(&self, id: &CoinId) -> bool {
        self.0.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CoinId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Comma-joined identifiers, as expected by the `ids` query parameter
    pub fn ids_param(&self) -> String {
        self.0
            .iter()
            .map(CoinId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for CoinSet {
    fn default() -> Self {
        Self(
            DEFAULT_COINS
                .iter()
                .map(|id| CoinId(id.to_string()))
                .collect(),
        )
    }
}

impl TryFrom<Vec<CoinId>> for CoinSet {
    type Error = CoinIdError;

    fn try_from(value: Vec<CoinId>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CoinSet> for Vec<CoinId> {
    fn from(set: CoinSet) -> Self {
        set.0.into_iter().collect()
    }
}

/// A single price observation for one coin. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Coin this observation belongs to
    pub coin: CoinId,
    /// Exchange ticker as reported by the API (e.g. "btc")
    pub symbol: String,
    /// Human-readable name (e.g. "Bitcoin")
    pub name: String,
    /// Current price in the configured base currency
    pub price: Decimal,
    /// Price change over the last 24 hours, in percent
    pub change_24h: Option<Decimal>,
    /// Market capitalisation in the base currency
    pub market_cap: Option<Decimal>,
    /// Trading volume over the last 24 hours in the base currency
    pub volume: Option<Decimal>,
    /// When the API observed this price
    pub observed_at: DateTime<Utc>,
}

/// Prices keyed by coin, sorted for stable output
pub type PriceMap = BTreeMap<CoinId, PricePoint>;

/// A single `(timestamp, price)` sample of a price history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub at: DateTime<Utc>,
    pub price: f64,
}

/// Ordered price samples per coin
pub type PriceHistory = BTreeMap<CoinId, Vec<HistorySample>>;

/// Returns the ticker shown to the user for a coin
///
/// Well-known coins use their familiar ticker; anything else falls back to the
/// symbol reported by the API, upper-cased.
pub fn display_symbol(coin: &CoinId, api_symbol: &str) -> String {
    match coin.as_str() {
        "bitcoin" => "BTC".to_string(),
        "ethereum" => "ETH".to_string(),
        "binancecoin" => "BNB".to_string(),
        "solana" => "SOL".to_string(),
        "monero" => "XMR".to_string(),
        _ => api_symbol.to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_id_normalizes_case_and_whitespace() {
        let id = CoinId::new("  Bitcoin ").unwrap();
        assert_eq!(id.as_str(), "bitcoin");
    }

    #[test]
    fn test_coin_id_accepts_dashes_and_digits() {
        assert!(CoinId::new("usd-coin").is_ok());
        assert!(CoinId::new("1inch").is_ok());
    }

    #[test]
    fn test_coin_id_rejects_invalid_input() {
        assert_eq!(
            CoinId::new(""),
            Err(CoinIdError::InvalidCoinId(String::new()))
        );
        assert!(CoinId::new("bit coin").is_err());
        assert!(CoinId::new("btc/usd").is_err());
        assert!(CoinId::new(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_coin_set_deduplicates_and_sorts() {
        let set = CoinSet::parse(["solana", "bitcoin", "BITCOIN"]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.ids_param(), "bitcoin,solana");
    }

    #[test]
    fn test_coin_set_rejects_empty() {
        let empty: [&str; 0] = [];
        assert_eq!(CoinSet::parse(empty), Err(CoinIdError::EmptyCoinSet));
    }

    #[test]
    fn test_coin_set_parse_stops_on_invalid_id() {
        let result = CoinSet::parse(["bitcoin", "not valid"]);
        assert!(matches!(result, Err(CoinIdError::InvalidCoinId(_))));
    }

    #[test]
    fn test_coin_set_deserialize_validates() {
        let ok: CoinSet = serde_json::from_str(r#"["ethereum","bitcoin"]"#).unwrap();
        assert!(ok.contains(&CoinId::new("bitcoin").unwrap()));

        assert!(serde_json::from_str::<CoinSet>("[]").is_err());
        assert!(serde_json::from_str::<CoinSet>(r#"["bad id"]"#).is_err());
    }

    #[test]
    fn test_default_coins_are_valid() {
        assert_eq!(CoinSet::parse(DEFAULT_COINS).unwrap(), CoinSet::default());
    }

    #[test]
    fn test_display_symbol_known_and_unknown() {
        let btc = CoinId::new("bitcoin").unwrap();
        let doge = CoinId::new("dogecoin").unwrap();
        assert_eq!(display_symbol(&btc, "btc"), "BTC");
        assert_eq!(display_symbol(&doge, "doge"), "DOGE");
    }
}
