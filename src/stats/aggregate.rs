//! Per-side cost basis aggregation

use crate::fills::{Fill, FillError, FillHistory, Side};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Totals for all fills of one side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStat {
    /// Side the totals were computed for
    pub side: Side,
    /// Sum of fill sizes (base currency)
    pub quantity: Decimal,
    /// Sum of fees (quote currency)
    pub fee: Decimal,
    /// Sum of quote volume before fees
    pub volume: Decimal,
    /// Fee-adjusted average unit price
    pub average_cost: Decimal,
    /// Number of fills included
    pub fill_count: usize,
    /// Oldest fill of this side
    pub first_at: DateTime<Utc>,
    /// Newest fill of this side
    pub last_at: DateTime<Utc>,
}

/// Buy and sell aggregates of one history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillSummary {
    pub buy: Option<AggregateStat>,
    pub sell: Option<AggregateStat>,
}

impl FillSummary {
    /// Base currency bought minus sold
    pub fn net_quantity(&self) -> Decimal {
        let bought = self.buy.as_ref().map_or(Decimal::ZERO, |s| s.quantity);
        let sold = self.sell.as_ref().map_or(Decimal::ZERO, |s| s.quantity);
        bought - sold
    }

    pub fn get(&self, side: Side) -> Option<&AggregateStat> {
        match side {
            Side::Buy => self.buy.as_ref(),
            Side::Sell => self.sell.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_none() && self.sell.is_none()
    }
}

/// Aggregate every fill of `side` in `history`
///
/// Returns `Ok(None)` when the history has no fill of that side, so callers
/// can tell "no trades" apart from trades that cost nothing. Buy averages
/// include fees, sell averages deduct them.
pub fn aggregate(history: &FillHistory, side: Side) -> Result<Option<AggregateStat>, FillError> {
    aggregate_fills(history.iter(), side)
}

/// Compute both sides at once
pub fn summarize(history: &FillHistory) -> Result<FillSummary, FillError> {
    Ok(FillSummary {
        buy: aggregate(history, Side::Buy)?,
        sell: aggregate(history, Side::Sell)?,
    })
}

fn aggregate_fills<'a, I>(fills: I, side: Side) -> Result<Option<AggregateStat>, FillError>
where
    I: IntoIterator<Item = &'a Fill>,
{
    let mut stat: Option<AggregateStat> = None;

    for fill in fills.into_iter().filter(|f| f.side == side) {
        fill.validate()?;

        match stat.as_mut() {
            None => {
                stat = Some(AggregateStat {
                    side,
                    quantity: fill.size,
                    fee: fill.fee,
                    volume: fill.quote_volume,
                    average_cost: Decimal::ZERO,
                    fill_count: 1,
                    first_at: fill.created_at,
                    last_at: fill.created_at,
                });
            }
            Some(s) => {
                s.quantity = checked_sum(s.quantity, fill.size, "quantity")?;
                s.fee = checked_sum(s.fee, fill.fee, "fee")?;
                s.volume = checked_sum(s.volume, fill.quote_volume, "volume")?;
                s.fill_count += 1;
                s.first_at = s.first_at.min(fill.created_at);
                s.last_at = s.last_at.max(fill.created_at);
            }
        }
    }

    let Some(mut stat) = stat else {
        return Ok(None);
    };

    let basis = match side {
        Side::Buy => stat.volume.checked_add(stat.fee),
        Side::Sell => stat.volume.checked_sub(stat.fee),
    }
    .ok_or_else(|| {
        FillError::Data(format!(
            "{} basis of volume {} and fee {} overflowed",
            side, stat.volume, stat.fee
        ))
    })?;
    stat.average_cost = basis
        .checked_div(stat.quantity)
        .ok_or_else(|| FillError::Data(format!("cannot average over quantity {}", stat.quantity)))?
        .normalize();

    tracing::debug!(
        side = %side,
        fills = stat.fill_count,
        quantity = %stat.quantity,
        average_cost = %stat.average_cost,
        "Aggregated fills"
    );

    Ok(Some(stat))
}

fn checked_sum(acc: Decimal, value: Decimal, field: &str) -> Result<Decimal, FillError> {
    acc.checked_add(value)
        .ok_or_else(|| FillError::Data(format!("{} total overflowed", field)))
}
