//! Wire types for the exchange REST API

use crate::fills::{Fill, FillError, Side};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Raw fill as returned by `GET /fills`
///
/// Decimal fields stay strings here and are parsed exactly in
/// [`TryFrom<RawFill> for Fill`](Fill).
#[derive(Debug, Clone, Deserialize)]
pub struct RawFill {
    pub created_at: String,
    /// Numeric on the current API, string on some older responses
    pub trade_id: serde_json::Value,
    pub side: String,
    pub price: String,
    pub size: String,
    pub fee: String,
    #[serde(default)]
    pub usd_volume: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
}

impl TryFrom<RawFill> for Fill {
    type Error = FillError;

    fn try_from(raw: RawFill) -> Result<Self, Self::Error> {
        let trade_id = match raw.trade_id {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => {
                return Err(FillError::Data(format!("unexpected trade_id: {}", other)));
            }
        };

        let created_at = DateTime::parse_from_rfc3339(&raw.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                FillError::Data(format!(
                    "fill {}: invalid created_at {:?}: {}",
                    trade_id, raw.created_at, e
                ))
            })?;

        let price = parse_decimal(&trade_id, "price", &raw.price)?;
        let size = parse_decimal(&trade_id, "size", &raw.size)?;
        let fee = parse_decimal(&trade_id, "fee", &raw.fee)?;
        let quote_volume = match raw.usd_volume.as_deref() {
            Some(v) => parse_decimal(&trade_id, "usd_volume", v)?,
            None => price.checked_mul(size).ok_or_else(|| {
                FillError::Data(format!(
                    "fill {}: notional of {} x {} overflowed",
                    trade_id, price, size
                ))
            })?,
        };

        let fill = Fill {
            side: raw.side.parse::<Side>()?,
            trade_id,
            price,
            size,
            fee,
            quote_volume,
            created_at,
        };
        fill.validate()?;
        Ok(fill)
    }
}

/// Parse an exchange decimal string without going through a float
pub fn parse_decimal(trade_id: &str, field: &str, value: &str) -> Result<Decimal, FillError> {
    Decimal::from_str(value.trim()).map_err(|e| {
        FillError::Data(format!(
            "fill {}: invalid {} {:?}: {}",
            trade_id, field, value, e
        ))
    })
}

/// Product ticker from `GET /products/{id}/ticker`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    /// Last trade price
    pub price: Decimal,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
    /// 24h volume in base currency
    #[serde(default)]
    pub volume: Option<Decimal>,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
}

/// Error body returned by the exchange
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}
