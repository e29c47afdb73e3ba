//! Average cost versus market price

use crate::fills::FillError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Signed percentage by which `market_price` differs from `average`
///
/// `(market_price - average) / average * 100`. Positive when the market is
/// above the average; whether that is a gain is up to the caller.
pub fn percent_delta(average: Decimal, market_price: Decimal) -> Result<Decimal, FillError> {
    if average.is_zero() {
        return Err(FillError::Data(
            "cannot compare against a zero average".to_string(),
        ));
    }

    market_price
        .checked_sub(average)
        .and_then(|diff| diff.checked_div(average))
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .map(|pct| pct.normalize())
        .ok_or_else(|| {
            FillError::Data(format!(
                "percent delta of {} against {} overflowed",
                market_price, average
            ))
        })
}
