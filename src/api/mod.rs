//! Exchange REST API access
//!
//! Signed requests against the exchange for accounts, tickers and fill
//! pages.

mod auth;
mod client;
mod types;

pub use auth::{Credentials, Signer};
pub use client::{ExchangeClient, ExchangeConfig, AFTER_HEADER, EXCHANGE_API_URL};
pub use types::{parse_decimal, RawFill, Ticker};
