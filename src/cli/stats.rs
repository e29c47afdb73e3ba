//! Stats command implementation

use super::render::{self, ConsoleProgress};
use super::Context;
use crate::account::{AccountSnapshot, ResolvedCoin};
use crate::fills::Side;
use crate::stats::{percent_delta, summarize};
use chrono::Utc;
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Coin symbol, e.g. BTC
    pub coin: String,

    /// Print every fill before the summary
    #[arg(long)]
    pub show_fills: bool,
}

impl StatsArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let snapshot = ctx.snapshot().await?;
        report(ctx, &snapshot, &self.coin, self.show_fills).await
    }
}

/// Fetch, aggregate and print the cost basis report for one coin
pub(crate) async fn report(
    ctx: &Context,
    snapshot: &AccountSnapshot,
    coin: &str,
    show_fills: bool,
) -> anyhow::Result<()> {
    let ResolvedCoin {
        account,
        product_id,
    } = snapshot.resolve(coin)?;

    println!("{}", render::account_table(account));

    let fetcher = ctx.fetcher(Arc::new(ConsoleProgress));
    let history = ctx.fetch_history(&fetcher, &product_id).await?;

    if history.is_empty() {
        println!("No fills found for {}: no trades", product_id);
        return Ok(());
    }

    if show_fills {
        println!("{}", render::fills_table(&history));
    }

    let summary = summarize(&history)?;

    let market_price = match ctx.client.get_ticker(&product_id).await {
        Ok(ticker) => Some(ticker.price),
        Err(e) => {
            tracing::warn!(product_id = %product_id, error = %e, "Ticker unavailable, skipping comparison");
            None
        }
    };

    let mut deltas = Vec::new();
    if let Some(price) = market_price {
        for side in [Side::Buy, Side::Sell] {
            if let Some(stat) = summary.get(side) {
                match percent_delta(stat.average_cost, price) {
                    Ok(delta) => deltas.push((side, delta)),
                    Err(e) => tracing::warn!(side = %side, error = %e, "Cannot compare average"),
                }
            }
        }
    }

    println!("{}", render::summary_table(&summary, &deltas));

    if let Some(price) = market_price {
        for (side, delta) in &deltas {
            if let Some(stat) = summary.get(*side) {
                println!(
                    "{}",
                    render::verdict_line(*side, stat.average_cost, price, *delta)
                );
            }
        }
    }

    println!(
        "Net position from fills: {} {}",
        render::format_decimal(summary.net_quantity()),
        account.currency
    );
    if let Some(latest) = history.latest() {
        println!(
            "Last trade {}",
            render::time_ago(latest.created_at, Utc::now())
        );
    }

    Ok(())
}
