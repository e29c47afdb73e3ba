//! Fill history types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Trade side of a fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Bought the base currency
    Buy,
    /// Sold the base currency
    Sell,
}

impl Side {
    /// Lowercase name as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Side {
    type Err = FillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(FillError::Data(format!("unknown side: {}", other))),
        }
    }
}

/// Opaque pagination token marking a position in a fill stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One executed trade leg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Exchange trade identifier (display only)
    pub trade_id: String,
    /// Trade side
    pub side: Side,
    /// Quote currency per unit
    pub price: Decimal,
    /// Base currency quantity
    pub size: Decimal,
    /// Fee paid in quote currency
    pub fee: Decimal,
    /// Quote currency notional before fee
    pub quote_volume: Decimal,
    /// Execution time on the exchange clock
    pub created_at: DateTime<Utc>,
}

impl Fill {
    /// Reject fills the exchange should never produce
    pub fn validate(&self) -> Result<(), FillError> {
        if self.size <= Decimal::ZERO {
            return Err(FillError::Data(format!(
                "fill {} has non-positive size {}",
                self.trade_id, self.size
            )));
        }
        Ok(())
    }
}

/// A single page returned by the fill endpoint
#[derive(Debug, Clone, Default)]
pub struct FillPage {
    /// Fills in the order the exchange returned them
    pub fills: Vec<Fill>,
    /// Cursor for the next page, `None` at end of stream
    pub after: Option<PageCursor>,
}

impl FillPage {
    pub fn new(fills: Vec<Fill>, after: Option<PageCursor>) -> Self {
        Self { fills, after }
    }

    pub fn len(&self) -> usize {
        self.fills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }
}

/// Complete fill history for one product, newest first
///
/// Only produced from a fully drained cursor stream, so a `FillHistory` is
/// never partial. It cannot be mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillHistory {
    product_id: String,
    fills: Vec<Fill>,
}

impl FillHistory {
    pub fn new(product_id: impl Into<String>, fills: Vec<Fill>) -> Self {
        Self {
            product_id: product_id.into(),
            fills,
        }
    }

    /// Product the history was fetched for (e.g. "BTC-USD")
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fill> {
        self.fills.iter()
    }

    pub fn len(&self) -> usize {
        self.fills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }

    /// Most recent fill by exchange timestamp
    pub fn latest(&self) -> Option<&Fill> {
        self.fills.iter().max_by_key(|f| f.created_at)
    }
}

impl<'a> IntoIterator for &'a FillHistory {
    type Item = &'a Fill;
    type IntoIter = std::slice::Iter<'a, Fill>;

    fn into_iter(self) -> Self::IntoIter {
        self.fills.iter()
    }
}

/// Errors produced while fetching or reducing fills
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FillError {
    /// Transient transport failure, including request timeouts
    #[error("Network error: {0}")]
    Network(String),
    /// Pagination or response shape violated the exchange contract
    #[error("Protocol error: {0}")]
    Protocol(String),
    /// Malformed record or impossible computation
    #[error("Data error: {0}")]
    Data(String),
    /// Currency is not among the account holdings
    #[error("{0} is not a traded coin")]
    UnknownCoin(String),
    /// Exchange refused the request
    #[error("Request rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    /// Fetch aborted by the caller
    #[error("Fetch cancelled: {0}")]
    Cancelled(String),
    /// Client could not be set up
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FillError {
    /// Only transport failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, FillError::Network(_))
    }

    pub fn timeout(after: Duration) -> Self {
        FillError::Network(format!("request timed out after {:?}", after))
    }
}
