//! Integration tests for CLI argument handling
//!
//! Runs the binary for flag validation and exit codes. Nothing here reaches
//! the real API: runs that get past argument handling point the client at a
//! local mock server or a closed local port, with the home and XDG
//! directories moved into a temporary directory.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_coinprice"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute coinprice")
}

/// Runs the CLI with `home` as its home, cache and config directory
fn run_cli_in(home: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_coinprice"))
        .args(args)
        .env_remove("RUST_LOG")
        .env("HOME", home)
        .env("XDG_CACHE_HOME", home.join("cache"))
        .env("XDG_CONFIG_HOME", home.join("config"))
        .output()
        .expect("Failed to execute coinprice")
}

fn write_config(dir: &Path, name: &str, contents: &str) -> String {
    let config = dir.join(name);
    fs::write(&config, contents).unwrap();
    config.to_str().unwrap().to_string()
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("coinprice"), "Help should mention coinprice");
    assert!(stdout.contains("--quiet"));
    assert!(stdout.contains("--no-graph"));
    assert!(stdout.contains("--coins"));
}

#[test]
fn test_quiet_and_verbose_conflict() {
    let output = run_cli(&["-q", "-v"]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot be used with"), "unexpected stderr: {}", stderr);
}

#[test]
fn test_invalid_coins_prints_error_and_exits() {
    let output = run_cli(&["--coins", "not a coin"]);
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid --coins value"),
        "Should print error message about the coin list: {}",
        stderr
    );
}

#[test]
fn test_unreachable_api_without_cache_exits_non_zero() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(
        temp_dir.path(),
        "config.yaml",
        "cache:\n  enabled: false\napi:\n  endpoint: http://127.0.0.1:1\n  timeout: 2\n",
    );

    let output = run_cli_in(temp_dir.path(), &["-c", &config, "--no-graph"]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no price data available"), "unexpected stderr: {}", stderr);
    assert!(output.stdout.is_empty());
}

#[tokio::test]
async fn test_stale_prices_exit_successfully() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/coins/markets"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "current_price": 50000,
                 "price_change_percentage_24h": 1.5}]"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let online = write_config(
        temp_dir.path(),
        "online.yaml",
        &format!(
            "coins: [bitcoin]\ncache:\n  enabled: false\napi:\n  endpoint: {}\n  timeout: 5\n",
            server.uri()
        ),
    );
    let offline = write_config(
        temp_dir.path(),
        "offline.yaml",
        "coins: [bitcoin]\ncache:\n  enabled: false\napi:\n  endpoint: http://127.0.0.1:1\n  timeout: 2\n",
    );

    let first = run_cli_in(temp_dir.path(), &["-c", &online, "--no-graph"]);
    assert_eq!(first.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&first.stderr));
    assert!(!String::from_utf8_lossy(&first.stdout).contains("(stale)"));

    let second = run_cli_in(temp_dir.path(), &["-c", &offline, "--no-graph"]);
    assert_eq!(second.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&second.stderr));

    let stdout = String::from_utf8_lossy(&second.stdout);
    assert!(stdout.contains("(stale)"), "unexpected stdout: {}", stdout);
    assert!(stdout.contains("$50,000.00"));
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use coinprice::cli::{Cli, DisplayOptions, OutputMode};
    use coinprice::settings::Settings;

    #[test]
    fn test_cli_no_args_uses_settings() {
        let cli = Cli::parse_from(["coinprice"]);
        let options = DisplayOptions::resolve(&cli, &Settings::default()).unwrap();

        assert_eq!(options.mode, OutputMode::Normal);
        assert_eq!(options.coins, Settings::default().coins);
    }

    #[test]
    fn test_cli_long_flags() {
        let cli = Cli::parse_from(["coinprice", "--verbose", "--no-graph", "--config", "c.yaml"]);
        assert!(cli.verbose);
        assert!(cli.no_graph);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("c.yaml")));
    }

    #[test]
    fn test_cli_coins_are_comma_separated() {
        let cli = Cli::parse_from(["coinprice", "--coins", "bitcoin,monero"]);
        assert_eq!(cli.coins, vec!["bitcoin", "monero"]);
    }

    #[test]
    fn test_quiet_mode_has_no_graph() {
        let cli = Cli::parse_from(["coinprice", "--quiet"]);
        let options = DisplayOptions::resolve(&cli, &Settings::default()).unwrap();

        assert_eq!(options.mode, OutputMode::Quiet);
        assert!(!options.show_graph);
    }
}
