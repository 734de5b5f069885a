//! coinprice library
//!
//! Exposes the price cache, API clients, settings and reports so the binary
//! and the integration tests share one implementation.

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod settings;
pub mod ui;
