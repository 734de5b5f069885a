//! One invocation of coinprice: fetch through the cache, then print
//!
//! Prices come from the price cache, which falls back to the last good data
//! when CoinGecko cannot be reached. Graph history is best effort and never
//! fails the run.

use std::io::{self, IsTerminal, Write};

use chrono::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{CacheManager, CachedPrices, PriceCache, PriceCacheError, SystemClock};
use crate::cli::{DisplayOptions, OutputMode};
use crate::data::{CoinGeckoClient, FetchError, HistoryClient};
use crate::settings::Settings;
use crate::ui::{quiet_line, write_widget, PriceFormatter, PriceReport, TrendReport};

/// Persisted data older than this is never shown
pub const FALLBACK_MAX_AGE_HOURS: i64 = 24;

/// Errors that end an invocation
#[derive(Debug, Error)]
pub enum AppError {
    /// Neither a fetch nor the cache produced any prices
    #[error(transparent)]
    NoData(#[from] PriceCacheError),

    /// The HTTP client could not be built
    #[error("Failed to set up API client: {0}")]
    Client(#[from] FetchError),

    /// Writing the report failed
    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Fetches prices for the requested coins and prints them to stdout
///
/// Prices are persisted in the per-user cache directory when the settings
/// call for it.
pub async fn run(options: &DisplayOptions, settings: &Settings) -> Result<(), AppError> {
    let store = match settings.store_usage() {
        Some(_) => {
            let store = CacheManager::new();
            if store.is_none() {
                warn!("no cache directory available, prices will not be persisted");
            }
            store
        }
        None => None,
    };

    let mut stdout = io::stdout();
    let styled = stdout.is_terminal();
    run_with(options, settings, store, &mut stdout, styled).await
}

/// Same as `run`, with an explicit store and output
///
/// `store` is only used as far as `Settings::store_usage` allows.
pub async fn run_with(
    options: &DisplayOptions,
    settings: &Settings,
    store: Option<CacheManager>,
    out: &mut impl Write,
    styled: bool,
) -> Result<(), AppError> {
    let client = CoinGeckoClient::new(&settings.api, &settings.currency.base)?;
    let max_age = Duration::hours(FALLBACK_MAX_AGE_HOURS);

    let mut cache = PriceCache::new(client.clone(), SystemClock, settings.freshness());
    if let (Some(store), Some(usage)) = (store.as_ref(), settings.store_usage()) {
        cache = cache.with_store(store.clone(), max_age).store_usage(usage);
    }

    let prices = cache.get(&options.coins).await?;
    if prices.is_stale {
        warn!(fetched_at = %prices.fetched_at, "showing cached prices after a failed refresh");
    }

    let formatter = PriceFormatter::from_settings(settings);
    write_prices(&prices, &formatter, options.mode, out, styled)?;

    if options.show_graph {
        let mut history_client = HistoryClient::new(client);
        if let Some(store) = store.filter(|_| settings.api.use_fallback) {
            history_client = history_client.with_store(store, max_age);
        }
        write_history(&history_client, &prices, &formatter, options, settings, out, styled).await?;
    }

    out.flush()?;
    Ok(())
}

fn write_prices(
    prices: &CachedPrices,
    formatter: &PriceFormatter,
    mode: OutputMode,
    out: &mut impl Write,
    styled: bool,
) -> io::Result<()> {
    if mode == OutputMode::Quiet {
        if let Some(line) = quiet_line(prices, formatter, styled) {
            writeln!(out, "{}", line)?;
        }
        return Ok(());
    }

    let report = PriceReport::new(prices, formatter).verbose(mode == OutputMode::Verbose);
    let (width, height) = (report.width(), report.height());
    write_widget(report, width, height, styled, out)
}

async fn write_history(
    client: &HistoryClient,
    prices: &CachedPrices,
    formatter: &PriceFormatter,
    options: &DisplayOptions,
    settings: &Settings,
    out: &mut impl Write,
    styled: bool,
) -> io::Result<()> {
    let days = settings.graph.days;
    let history = client.fetch_history(&options.coins, days).await;

    let report = history.as_ref().map(|history| {
        TrendReport::new(&prices.prices, history, formatter)
            .days(days)
            .graph_width(settings.graph.width)
            .style(settings.graph.style)
    });

    match report {
        Some(report) if !report.is_empty() => {
            let (width, height) = (report.width(), report.height());
            writeln!(out)?;
            write_widget(report, width, height, styled, out)
        }
        _ => {
            debug!("no overlap between prices and history");
            writeln!(out, "\nNo historical data available for graphs")
        }
    }
}
