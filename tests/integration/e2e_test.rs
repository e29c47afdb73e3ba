//! End-to-end integration tests

use crate::support::{fill, VecSource};
use cbp_stats::account::{Account, AccountSnapshot};
use cbp_stats::cli::render::{summary_table, verdict_line};
use cbp_stats::cli::{Cli, Commands};
use cbp_stats::config::Config;
use cbp_stats::fills::{FillError, PaginatedFetcher, Side};
use cbp_stats::stats::{percent_delta, summarize};
use clap::Parser;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn account(currency: &str, balance: Decimal) -> Account {
    Account {
        id: format!("{}-account", currency.to_lowercase()),
        currency: currency.to_string(),
        balance,
        available: balance,
        hold: Decimal::ZERO,
    }
}

#[test]
fn test_config_example_loads() {
    let config = Config::example().unwrap();
    let fetch = config.fetch.to_fetch_config();
    assert_eq!(fetch.page_size, 100);
    assert_eq!(config.exchange.quote_currency, "USD");
    assert!(config.telemetry.metrics_port.is_none());
}

#[test]
fn test_cli_parses_commands() {
    let cli = Cli::try_parse_from(["cbp-stats"]).unwrap();
    assert!(cli.command.is_none());
    assert_eq!(cli.config, "config.toml");

    let cli = Cli::try_parse_from(["cbp-stats", "list"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Balance(_))));

    let cli =
        Cli::try_parse_from(["cbp-stats", "-c", "alt.toml", "stats", "btc", "--show-fills"])
            .unwrap();
    assert_eq!(cli.config, "alt.toml");
    match cli.command {
        Some(Commands::Stats(args)) => {
            assert_eq!(args.coin, "btc");
            assert!(args.show_fills);
        }
        other => panic!("unexpected command {:?}", other),
    }

    let cli = Cli::try_parse_from(["cbp-stats", "compare", "BTC", "ETH"]).unwrap();
    match cli.command {
        Some(Commands::Compare(args)) => assert_eq!(args.coins, vec!["BTC", "ETH"]),
        other => panic!("unexpected command {:?}", other),
    }

    assert!(Cli::try_parse_from(["cbp-stats", "compare"]).is_err());
}

#[test]
fn test_unknown_coin_is_reported() {
    let snapshot = AccountSnapshot::new(
        vec![account("USD", dec!(100)), account("BTC", dec!(1))],
        "USD",
    );
    assert!(matches!(
        snapshot.resolve("doge"),
        Err(FillError::UnknownCoin(c)) if c == "DOGE"
    ));
    assert!(matches!(snapshot.resolve("usd"), Err(FillError::UnknownCoin(_))));
}

#[tokio::test]
async fn test_resolve_fetch_summarize_compare() {
    colored::control::set_override(false);

    let snapshot = AccountSnapshot::new(
        vec![account("USD", dec!(100)), account("ETH", dec!(1.5))],
        "USD",
    );
    let resolved = snapshot.resolve(" eth ").unwrap();
    assert_eq!(resolved.product_id, "ETH-USD");

    let source = Arc::new(VecSource::new(vec![
        fill(3, Side::Sell, dec!(0.5), dec!(2000), dec!(1)),
        fill(2, Side::Buy, dec!(1), dec!(1000), dec!(5)),
        fill(1, Side::Buy, dec!(1), dec!(1000), dec!(5)),
    ]));
    let fetcher = PaginatedFetcher::new(source);
    let history = fetcher.fetch_all(&resolved.product_id).await.unwrap();
    let summary = summarize(&history).unwrap();

    let buy = summary.buy.as_ref().unwrap();
    let sell = summary.sell.as_ref().unwrap();
    assert_eq!(buy.average_cost, dec!(1005));
    assert_eq!(sell.average_cost, dec!(1998));
    assert_eq!(summary.net_quantity(), dec!(1.5));
    assert_eq!(history.latest().unwrap().trade_id, "3");

    let market = dec!(1105.5);
    let delta = percent_delta(buy.average_cost, market).unwrap();
    assert_eq!(delta, dec!(10));

    let table = summary_table(&summary, &[(Side::Buy, delta)]);
    assert!(table.contains("1005"));
    assert!(table.contains("+10.00%"));

    assert_eq!(
        verdict_line(Side::Buy, buy.average_cost, market, delta),
        "Market 1105.5 is 10.00% above your average buy price 1005"
    );
}
