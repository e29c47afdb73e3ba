//! Compare command implementation

use super::render::{self, Table};
use super::Context;
use crate::fills::{FillHistory, LogProgress, Side};
use crate::stats::{percent_delta, summarize};
use clap::Args;
use rust_decimal::Decimal;
use std::sync::Arc;

const COLUMNS: [&str; 7] = [
    "product", "fills", "net qty", "avg buy", "avg sell", "market", "vs buy",
];

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Coin symbols, e.g. BTC ETH
    #[arg(required = true, num_args = 1..)]
    pub coins: Vec<String>,
}

impl CompareArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let snapshot = ctx.snapshot().await?;

        let mut product_ids = Vec::new();
        for coin in &self.coins {
            match snapshot.resolve(coin) {
                Ok(resolved) => product_ids.push(resolved.product_id),
                Err(e) => println!("{}", e),
            }
        }
        if product_ids.is_empty() {
            return Ok(());
        }

        let fetcher = ctx.fetcher(Arc::new(LogProgress));
        let results = ctx.fetch_histories(&fetcher, &product_ids).await;

        let mut table = Table::new(&COLUMNS);
        let mut failures = Vec::new();

        for (product_id, result) in results {
            match result {
                Ok(history) => match self.row(ctx, &history).await {
                    Ok(row) => table.push_row(row),
                    Err(e) => failures.push((product_id, e.to_string())),
                },
                Err(e) => failures.push((product_id, e.to_string())),
            }
        }

        if !table.is_empty() {
            println!("{}", table.render());
        }
        for (product_id, error) in failures {
            println!("{}: {}", product_id, error);
        }
        Ok(())
    }

    async fn row(&self, ctx: &Context, history: &FillHistory) -> anyhow::Result<Vec<String>> {
        let product_id = history.product_id();
        if history.is_empty() {
            return Ok(empty_row(product_id));
        }

        let summary = summarize(history)?;
        let market = match ctx.client.get_ticker(product_id).await {
            Ok(ticker) => Some(ticker.price),
            Err(e) => {
                tracing::warn!(product_id, error = %e, "Ticker unavailable");
                None
            }
        };

        let average = |side: Side| summary.get(side).map(|s| s.average_cost.round_dp(8));
        let delta = match (summary.get(Side::Buy), market) {
            (Some(buy), Some(price)) => Some(percent_delta(buy.average_cost, price)?),
            _ => None,
        };
        let show = |v: Option<Decimal>| v.map_or("-".to_string(), render::format_decimal);

        Ok(vec![
            product_id.to_string(),
            history.len().to_string(),
            render::format_decimal(summary.net_quantity()),
            show(average(Side::Buy)),
            show(average(Side::Sell)),
            show(market),
            delta.map_or("-".to_string(), render::format_percent),
        ])
    }
}

/// Row for a product without fills
fn empty_row(product_id: &str) -> Vec<String> {
    vec![
        product_id.to_string(),
        "0".to_string(),
        "0".to_string(),
        "no trades".to_string(),
        "no trades".to_string(),
        "-".to_string(),
        "-".to_string(),
    ]
}
