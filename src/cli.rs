//! Command-line interface parsing for coinprice
//!
//! Flags are parsed with clap and then merged with the loaded settings into a
//! `DisplayOptions`, which is all the rest of the program looks at.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::data::{CoinIdError, CoinSet};
use crate::settings::{DisplayMode, Settings};

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The `--coins` list was empty or held an unusable id
    #[error("Invalid --coins value: {0}")]
    InvalidCoins(#[from] CoinIdError),
}

/// coinprice - Current cryptocurrency prices in your terminal
#[derive(Parser, Debug)]
#[command(name = "coinprice")]
#[command(about = "Cryptocurrency prices and price trends from CoinGecko")]
#[command(version)]
pub struct Cli {
    /// Only print the bitcoin price on one line
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Include market cap and 24h volume
    #[arg(short, long)]
    pub verbose: bool,

    /// Always show price trend graphs
    #[arg(short, long, conflicts_with = "no_graph")]
    pub graph: bool,

    /// Never show price trend graphs
    #[arg(short = 'n', long)]
    pub no_graph: bool,

    /// Configuration file to use instead of the per-user one
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Coins to show, by CoinGecko id
    ///
    /// Example: --coins bitcoin,ethereum,monero
    #[arg(long, value_name = "IDS", value_delimiter = ',')]
    pub coins: Vec<String>,
}

/// How much to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Quiet,
    Normal,
    Verbose,
}

/// What a single invocation should display
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayOptions {
    pub mode: OutputMode,
    pub show_graph: bool,
    pub coins: CoinSet,
}

impl DisplayOptions {
    /// Combines parsed flags with settings; flags always win
    ///
    /// Graphs are shown when `-g` is given, or when the settings ask for them
    /// and neither `-q` nor `--no-graph` is given.
    pub fn resolve(cli: &Cli, settings: &Settings) -> Result<Self, CliError> {
        let mode = if cli.quiet {
            OutputMode::Quiet
        } else if cli.verbose {
            OutputMode::Verbose
        } else {
            match settings.display.default_mode {
                DisplayMode::Quiet => OutputMode::Quiet,
                DisplayMode::Verbose => OutputMode::Verbose,
                DisplayMode::Normal | DisplayMode::Graph => OutputMode::Normal,
            }
        };

        let wants_graph = settings.display.show_graphs
            || settings.display.default_mode == DisplayMode::Graph;
        let show_graph = cli.graph || (wants_graph && mode != OutputMode::Quiet && !cli.no_graph);

        let coins = if cli.coins.is_empty() {
            settings.coins.clone()
        } else {
            CoinSet::parse(&cli.coins)?
        };

        Ok(Self {
            mode,
            show_graph,
            coins,
        })
    }
}
