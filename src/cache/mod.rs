//! Caching of price data
//!
//! `PriceCache` keeps the last successful fetch in memory and serves it while
//! fresh, or as a stale fallback when a refresh fails. `CacheManager` persists
//! responses to disk so that separate invocations of the CLI share them.

mod clock;
mod manager;
mod price_cache;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{CacheManager, CachedData};
pub use price_cache::{
    CachedPrices, PriceCache, PriceCacheError, StoreUsage, DEFAULT_FRESHNESS_SECS,
};
