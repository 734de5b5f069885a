//! coinprice - Cryptocurrency prices in the terminal
//!
//! Prints current prices for a handful of coins from CoinGecko, with a short
//! local cache that keeps showing the last known prices when the API is down.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use coinprice::app;
use coinprice::cli::{Cli, DisplayOptions};
use coinprice::settings::Settings;

/// Exit status after an interrupt, as shells report SIGINT
const INTERRUPTED: u8 = 130;

/// Exit status for unusable arguments, matching clap's own
const USAGE_ERROR: u8 = 2;

/// Logs go to stderr so that stdout only carries the report
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref());

    let options = match DisplayOptions::resolve(&cli, &settings) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(USAGE_ERROR);
        }
    };
    debug!(?options, "starting");

    tokio::select! {
        result = app::run(&options, &settings) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            ExitCode::from(INTERRUPTED)
        }
    }
}
