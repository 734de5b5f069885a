//! Price cache with fallback to the last known-good prices
//!
//! `PriceCache` wraps a `PriceFetcher`. Prices younger than the freshness
//! window are served without a request; older prices trigger a single refresh,
//! and if that refresh fails the previous prices are served flagged as stale.
//! Only when no prices were ever obtained does a failure reach the caller.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{CacheManager, Clock, SystemClock};
use crate::data::{CoinSet, FetchError, PriceFetcher, PriceMap};

/// Store key for the persisted prices
const PRICES_CACHE_KEY: &str = "prices";

/// Default freshness window
pub const DEFAULT_FRESHNESS_SECS: u64 = 300;

/// Returned when neither fresh nor cached prices can be produced
#[derive(Debug, Error)]
pub enum PriceCacheError {
    /// The fetch failed and there is no earlier data to fall back to
    #[error("no price data available ({0})")]
    NoCacheAvailable(#[source] FetchError),
}

/// Prices handed to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPrices {
    /// Prices for exactly the requested coins
    pub prices: PriceMap,
    /// When these prices were fetched
    pub fetched_at: DateTime<Utc>,
    /// True when a refresh failed and older data is being served
    pub is_stale: bool,
}

/// The last successful fetch. Replaced wholesale, never mutated.
#[derive(Debug, Clone)]
struct CacheEntry {
    prices: PriceMap,
    fetched_at: DateTime<Utc>,
    /// May be served as fresh while inside the window
    fresh_ok: bool,
    /// May be served as stale after a failed refresh
    fallback_ok: bool,
}

impl CacheEntry {
    fn covers(&self, coins: &CoinSet) -> bool {
        coins.iter().all(|coin| self.prices.contains_key(coin))
    }

    fn serve(&self, coins: &CoinSet, is_stale: bool) -> CachedPrices {
        let prices = self
            .prices
            .iter()
            .filter(|(coin, _)| coins.contains(coin))
            .map(|(coin, point)| (coin.clone(), point.clone()))
            .collect();

        CachedPrices {
            prices,
            fetched_at: self.fetched_at,
            is_stale,
        }
    }
}

/// What a persisted entry may be used for once loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreUsage {
    /// Skip requests while fresh, and fall back to it when a refresh fails
    FreshAndFallback,
    /// Only fall back to it; every invocation still refreshes
    FallbackOnly,
    /// Only skip requests while fresh; never served as stale
    FreshOnly,
}

/// Disk persistence of the last entry across invocations
#[derive(Debug, Clone)]
struct PersistentStore {
    manager: CacheManager,
    max_age: Duration,
    usage: StoreUsage,
    loaded: bool,
}

/// Short-lived price cache in front of a `PriceFetcher`
pub struct PriceCache<F, C = SystemClock> {
    fetcher: F,
    clock: C,
    freshness: Duration,
    entry: Option<CacheEntry>,
    store: Option<PersistentStore>,
}

impl<F: PriceFetcher, C: Clock> PriceCache<F, C> {
    pub fn new(fetcher: F, clock: C, freshness: Duration) -> Self {
        Self {
            fetcher,
            clock,
            freshness,
            entry: None,
            store: None,
        }
    }

    /// Persists every successful fetch through `manager`
    ///
    /// On first use the cache is seeded from the persisted prices, unless they
    /// are older than `max_age`, in which case they are ignored entirely.
    /// The seeded entry serves both as fresh data and as a fallback unless
    /// narrowed with `store_usage`.
    pub fn with_store(mut self, manager: CacheManager, max_age: Duration) -> Self {
        self.store = Some(PersistentStore {
            manager,
            max_age,
            usage: StoreUsage::FreshAndFallback,
            loaded: false,
        });
        self
    }

    /// Restricts what the persisted entry is used for; no-op without a store
    pub fn store_usage(mut self, usage: StoreUsage) -> Self {
        if let Some(ref mut store) = self.store {
            store.usage = usage;
        }
        self
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Returns prices for `coins`
    ///
    /// # Behavior
    /// - Data younger than the freshness window is returned without a fetch
    /// - Otherwise a single fetch is attempted and, on success, replaces the entry
    /// - On fetch failure the previous entry is returned with `is_stale = true`
    /// - With no previous entry the failure is returned as `NoCacheAvailable`
    pub async fn get(&mut self, coins: &CoinSet) -> Result<CachedPrices, PriceCacheError> {
        self.load_persisted();

        let now = self.clock.now();
        if let Some(ref entry) = self.entry {
            let age = now - entry.fetched_at;
            // A timestamp from the future counts as expired
            let fresh = age >= Duration::zero() && age < self.freshness;
            if entry.fresh_ok && entry.covers(coins) && fresh {
                debug!(age_secs = age.num_seconds(), "serving cached prices");
                return Ok(entry.serve(coins, false));
            }
        }

        debug!(coins = %coins.ids_param(), "refreshing prices");
        match self.fetcher.fetch(coins).await {
            Ok(prices) => {
                let entry = CacheEntry {
                    prices,
                    fetched_at: self.clock.now(),
                    fresh_ok: true,
                    fallback_ok: true,
                };
                self.persist(&entry);

                let served = entry.serve(coins, false);
                self.entry = Some(entry);
                Ok(served)
            }
            Err(error) => match self.entry {
                Some(ref entry) if entry.fallback_ok && entry.covers(coins) => {
                    warn!(
                        error = %error,
                        fetched_at = %entry.fetched_at,
                        "price refresh failed, serving stale prices"
                    );
                    Ok(entry.serve(coins, true))
                }
                _ => {
                    warn!(error = %error, "price refresh failed with nothing cached");
                    Err(PriceCacheError::NoCacheAvailable(error))
                }
            },
        }
    }

    /// Seeds the in-memory entry from disk, once
    fn load_persisted(&mut self) {
        let now = self.clock.now();
        let Some(ref mut store) = self.store else {
            return;
        };
        if store.loaded {
            return;
        }
        store.loaded = true;

        if self.entry.is_some() {
            return;
        }

        match store.manager.read_at::<PriceMap>(PRICES_CACHE_KEY, now) {
            Some(cached) if !cached.is_expired => {
                info!(cached_at = %cached.cached_at, "loaded persisted prices");
                self.entry = Some(CacheEntry {
                    prices: cached.data,
                    fetched_at: cached.cached_at,
                    fresh_ok: store.usage != StoreUsage::FallbackOnly,
                    fallback_ok: store.usage != StoreUsage::FreshOnly,
                });
            }
            Some(cached) => {
                debug!(cached_at = %cached.cached_at, "persisted prices too old, ignoring");
            }
            None => {}
        }
    }

    fn persist(&self, entry: &CacheEntry) {
        let Some(ref store) = self.store else {
            return;
        };

        if let Err(e) = store.manager.write_at(
            PRICES_CACHE_KEY,
            &entry.prices,
            store.max_age,
            entry.fetched_at,
        ) {
            warn!(error = %e, "failed to persist prices");
        }
    }
}
