//! cbp-stats: trade history and cost basis for exchange accounts
//!
//! This library provides the core components for:
//! - Draining the cursor-paginated fill endpoint into a complete history
//! - Exact decimal buy/sell aggregation with fee-adjusted average cost
//! - Comparing an average cost against the market price
//! - Signed REST access to accounts, tickers and fills
//! - The CLI, configuration and telemetry around them

pub mod account;
pub mod api;
pub mod cli;
pub mod config;
pub mod fills;
pub mod stats;
pub mod telemetry;
