//! User settings
//!
//! Settings are layered with the `config` crate: built-in defaults, then a YAML
//! file, then `COINPRICE__SECTION__KEY` environment variables. A bad value never
//! stops the program; it is reported and replaced by that key's default.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, warn};

use crate::cache::{StoreUsage, DEFAULT_FRESHNESS_SECS};
use crate::data::CoinSet;

/// How much detail to print
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Normal,
    Quiet,
    Verbose,
    Graph,
}

/// Where fetched prices are kept between invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Disk,
    Memory,
}

/// Character set used for sparklines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphStyle {
    Unicode,
    Ascii,
}

/// Whether changes and trends are colored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Default,
    Monochrome,
}

/// Placement of the currency symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettings {
    pub default_mode: DisplayMode,
    pub show_graphs: bool,
    pub price_decimals: u32,
    pub percent_decimals: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub enabled: bool,
    /// Freshness window in seconds
    pub expiration: u64,
    pub backend: CacheBackend,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphSettings {
    pub days: u32,
    pub width: usize,
    pub style: GraphStyle,
    pub color_scheme: ColorScheme,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrencySettings {
    pub base: String,
    pub symbol: String,
    pub symbol_position: SymbolPosition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Keep the last good prices on disk and show them when a refresh fails
    pub use_fallback: bool,
}

/// Complete, validated settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub coins: CoinSet,
    pub display: DisplaySettings,
    pub cache: CacheSettings,
    pub graph: GraphSettings,
    pub currency: CurrencySettings,
    pub api: ApiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            coins: CoinSet::default(),
            display: DisplaySettings {
                default_mode: DisplayMode::Normal,
                show_graphs: true,
                price_decimals: 2,
                percent_decimals: 2,
            },
            cache: CacheSettings {
                enabled: true,
                expiration: DEFAULT_FRESHNESS_SECS,
                backend: CacheBackend::Disk,
            },
            graph: GraphSettings {
                days: 7,
                width: 20,
                style: GraphStyle::Unicode,
                color_scheme: ColorScheme::Default,
            },
            currency: CurrencySettings {
                base: "usd".to_string(),
                symbol: "$".to_string(),
                symbol_position: SymbolPosition::Prefix,
            },
            api: ApiSettings {
                endpoint: "https://api.coingecko.com/api/v3".to_string(),
                api_key: None,
                timeout: 10,
                use_fallback: true,
            },
        }
    }
}

/// Path of the per-user configuration file
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "coinprice").map(|dirs| dirs.config_dir().join("config.yaml"))
}

impl Settings {
    /// Loads settings from the first existing file and the environment
    ///
    /// `explicit` is tried first; if it does not exist the per-user file is used.
    pub fn load(explicit: Option<&Path>) -> Self {
        let file = match explicit {
            Some(path) if path.exists() => Some(path.to_path_buf()),
            Some(path) => {
                warn!(path = %path.display(), "config file not found, trying user config");
                user_config_path().filter(|p| p.exists())
            }
            None => user_config_path().filter(|p| p.exists()),
        };

        Self::from_sources(file.as_deref(), true)
    }

    /// Loads settings from `file` only, ignoring the environment
    pub fn from_file(file: &Path) -> Self {
        Self::from_sources(Some(file), false)
    }

    fn from_sources(file: Option<&Path>, with_env: bool) -> Self {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(false));
        }
        if with_env {
            builder = builder.add_source(env_source());
        }

        let config = match builder.build() {
            Ok(config) => {
                if let Some(path) = file {
                    info!(path = %path.display(), "loaded configuration");
                }
                config
            }
            Err(e) => {
                warn!(error = %e, "failed to load configuration file, ignoring it");
                let mut fallback = Config::builder();
                if with_env {
                    fallback = fallback.add_source(env_source());
                }
                fallback.build().unwrap_or_default()
            }
        };

        Self::from_config(&config)
    }

    /// Extracts and validates every key, falling back per key to the defaults
    fn from_config(config: &Config) -> Self {
        let defaults = Settings::default();

        // `cryptocurrencies` is the older name of the list
        let raw_coins = match config.get::<Vec<String>>("coins") {
            Err(config::ConfigError::NotFound(_)) => config.get::<Vec<String>>("cryptocurrencies"),
            found => found,
        };
        let coins = match raw_coins {
            Ok(raw) => CoinSet::parse(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "invalid coin list, using defaults");
                defaults.coins.clone()
            }),
            Err(config::ConfigError::NotFound(_)) => defaults.coins.clone(),
            Err(e) => {
                warn!(error = %e, "invalid coin list, using defaults");
                defaults.coins.clone()
            }
        };

        let api_key = get_or(config, "api.api_key", String::new());

        Self {
            coins,
            display: DisplaySettings {
                default_mode: get_or(config, "display.default_mode", defaults.display.default_mode),
                show_graphs: get_or(config, "display.show_graphs", defaults.display.show_graphs),
                price_decimals: ranged(config, "display.price_decimals", defaults.display.price_decimals, 0, 10),
                percent_decimals: ranged(config, "display.percent_decimals", defaults.display.percent_decimals, 0, 10),
            },
            cache: CacheSettings {
                enabled: get_or(config, "cache.enabled", defaults.cache.enabled),
                expiration: ranged(config, "cache.expiration", defaults.cache.expiration, 30, 86_400),
                backend: get_or(config, "cache.backend", defaults.cache.backend),
            },
            graph: GraphSettings {
                days: ranged(config, "graph.days", defaults.graph.days, 1, 365),
                width: ranged(config, "graph.width", defaults.graph.width, 10, 200),
                style: get_or(config, "graph.style", defaults.graph.style),
                color_scheme: get_or(config, "graph.color_scheme", defaults.graph.color_scheme),
            },
            currency: CurrencySettings {
                base: get_or(config, "currency.base", defaults.currency.base),
                symbol: get_or(config, "currency.symbol", defaults.currency.symbol),
                symbol_position: get_or(config, "currency.symbol_position", defaults.currency.symbol_position),
            },
            api: ApiSettings {
                endpoint: get_or(config, "api.endpoint", defaults.api.endpoint),
                api_key: Some(api_key).filter(|key| !key.trim().is_empty()),
                timeout: ranged(config, "api.timeout", defaults.api.timeout, 1, 60),
                use_fallback: get_or(config, "api.use_fallback", defaults.api.use_fallback),
            },
        }
    }

    /// Freshness window for cached prices; zero when caching is disabled
    pub fn freshness(&self) -> chrono::Duration {
        if self.cache.enabled {
            chrono::Duration::seconds(self.cache.expiration as i64)
        } else {
            chrono::Duration::zero()
        }
    }

    /// How persisted prices are used, or `None` when nothing is persisted
    ///
    /// The disk cache shares fresh prices between invocations; the fallback
    /// keeps the last good prices for when a refresh fails. Either one needs
    /// the store.
    pub fn store_usage(&self) -> Option<StoreUsage> {
        let shared = self.cache.enabled && self.cache.backend == CacheBackend::Disk;
        match (shared, self.api.use_fallback) {
            (true, true) => Some(StoreUsage::FreshAndFallback),
            (false, true) => Some(StoreUsage::FallbackOnly),
            (true, false) => Some(StoreUsage::FreshOnly),
            (false, false) => None,
        }
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("COINPRICE")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("coins")
}

/// Reads `key`, using `default` when it is absent or invalid
fn get_or<T: DeserializeOwned + Debug>(config: &Config, key: &str, default: T) -> T {
    match config.get::<T>(key) {
        Ok(value) => value,
        Err(config::ConfigError::NotFound(_)) => default,
        Err(e) => {
            warn!(key, error = %e, ?default, "invalid setting, using default");
            default
        }
    }
}

/// Reads a numeric `key`, using `default` when it is invalid or outside `min..=max`
fn ranged<T>(config: &Config, key: &str, default: T, min: T, max: T) -> T
where
    T: DeserializeOwned + Debug + PartialOrd + Copy,
{
    let value = get_or(config, key, default);
    if value < min || value > max {
        warn!(key, ?value, ?min, ?max, ?default, "setting out of range, using default");
        return default;
    }
    value
}
