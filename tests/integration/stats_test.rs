//! Aggregation and market comparison over whole histories

use crate::support::{fill, synthetic_fills, VecSource};
use cbp_stats::fills::{FetchConfig, Fill, FillError, FillHistory, PaginatedFetcher, Side};
use cbp_stats::stats::{aggregate, percent_delta, summarize};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn mixed_history() -> FillHistory {
    FillHistory::new(
        "BTC-USD",
        vec![
            fill(1, Side::Buy, dec!(0.5), dec!(30000), dec!(7.5)),
            fill(2, Side::Sell, dec!(0.2), dec!(35000), dec!(3.5)),
            fill(3, Side::Buy, dec!(0.25), dec!(28000), dec!(3.5)),
            fill(4, Side::Buy, dec!(0.01), dec!(31000), dec!(0)),
            fill(5, Side::Sell, dec!(0.3), dec!(36000), dec!(5.4)),
        ],
    )
}

#[test]
fn test_fee_adjusted_averages() {
    let history = FillHistory::new(
        "BTC-USD",
        vec![
            fill(1, Side::Buy, dec!(1), dec!(100), dec!(1)),
            fill(2, Side::Sell, dec!(1), dec!(100), dec!(1)),
        ],
    );

    let summary = summarize(&history).unwrap();

    assert_eq!(summary.buy.unwrap().average_cost, dec!(101));
    assert_eq!(summary.sell.unwrap().average_cost, dec!(99));
}

/// (is_buy, size in satoshi, price in cents, fee in cents)
fn arb_fill() -> impl Strategy<Value = (bool, i64, i64, i64)> {
    (
        any::<bool>(),
        1i64..1_000_000_000,
        1i64..10_000_000,
        0i64..100_000,
    )
}

/// A random history and a random permutation of it
fn arb_fills_and_permutation() -> impl Strategy<Value = (Vec<Fill>, Vec<Fill>)> {
    prop::collection::vec(arb_fill(), 0..64)
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (is_buy, size, price, fee))| {
                    let side = if is_buy { Side::Buy } else { Side::Sell };
                    fill(
                        i,
                        side,
                        Decimal::new(size, 8),
                        Decimal::new(price, 2),
                        Decimal::new(fee, 2),
                    )
                })
                .collect::<Vec<_>>()
        })
        .prop_flat_map(|fills| (Just(fills.clone()), Just(fills).prop_shuffle()))
}

proptest! {
    #[test]
    fn test_summary_is_order_independent((original, shuffled) in arb_fills_and_permutation()) {
        let expected = summarize(&FillHistory::new("BTC-USD", original)).unwrap();
        let actual = summarize(&FillHistory::new("BTC-USD", shuffled)).unwrap();
        prop_assert_eq!(actual, expected);
    }
}

#[test]
fn test_buy_totals_match_inputs() {
    let buy = aggregate(&mixed_history(), Side::Buy).unwrap().unwrap();

    assert_eq!(buy.quantity, dec!(0.76));
    assert_eq!(buy.fee, dec!(11));
    assert_eq!(buy.volume, dec!(22310));
    assert_eq!(buy.fill_count, 3);
    // (22310 + 11) / 0.76
    assert_eq!(buy.average_cost, (dec!(22321) / dec!(0.76)).normalize());
}

#[test]
fn test_one_sided_history() {
    let history = FillHistory::new(
        "ETH-USD",
        vec![fill(1, Side::Buy, dec!(2), dec!(1500), dec!(6))],
    );

    let summary = summarize(&history).unwrap();

    assert!(summary.buy.is_some());
    assert!(summary.sell.is_none());
    assert_eq!(summary.net_quantity(), dec!(2));
}

#[test]
fn test_empty_history_has_no_aggregates() {
    let summary = summarize(&FillHistory::new("ETH-USD", vec![])).unwrap();
    assert!(summary.is_empty());
    assert_eq!(summary.net_quantity(), Decimal::ZERO);
}

#[test]
fn test_tiny_sizes_sum_exactly() {
    let fills = (0..10_000)
        .map(|i| fill(i, Side::Buy, dec!(0.00000001), dec!(30000), dec!(0)))
        .collect();
    let history = FillHistory::new("BTC-USD", fills);

    let buy = aggregate(&history, Side::Buy).unwrap().unwrap();

    assert_eq!(buy.quantity, dec!(0.0001));
    assert_eq!(buy.average_cost, dec!(30000));
}

#[test]
fn test_invalid_size_is_data_error() {
    let history = FillHistory::new(
        "BTC-USD",
        vec![
            fill(1, Side::Buy, dec!(1), dec!(100), dec!(1)),
            fill(2, Side::Buy, dec!(0), dec!(100), dec!(1)),
        ],
    );

    assert!(matches!(summarize(&history), Err(FillError::Data(_))));
}

#[test]
fn test_percent_delta_against_market() {
    assert_eq!(percent_delta(dec!(100), dec!(110)).unwrap(), dec!(10));
    assert_eq!(percent_delta(dec!(100), dec!(90)).unwrap(), dec!(-10));
    assert!(matches!(
        percent_delta(Decimal::ZERO, dec!(90)),
        Err(FillError::Data(_))
    ));
}

#[tokio::test]
async fn test_fetched_history_summarizes_every_page() {
    let fills = synthetic_fills(250);
    let source = Arc::new(VecSource::new(fills.clone()));
    let fetcher = PaginatedFetcher::with_config(source, FetchConfig::default());

    let history = fetcher.fetch_all("BTC-USD").await.unwrap();
    let summary = summarize(&history).unwrap();

    let buys = fills.iter().filter(|f| f.side == Side::Buy).count();
    let sells = fills.len() - buys;
    assert_eq!(summary.buy.as_ref().unwrap().fill_count, buys);
    assert_eq!(summary.sell.as_ref().unwrap().fill_count, sells);
    assert_eq!(summary.net_quantity(), dec!(0));
}
