//! Plain-text table rendering
//!
//! Everything here returns `String`s; color is only applied to whole lines
//! so column alignment is not thrown off by escape codes.

use crate::account::Account;
use crate::fills::{FillHistory, ProgressObserver, Side};
use crate::stats::{AggregateStat, FillSummary};
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use rust_decimal::Decimal;

/// Right-aligned text table
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: vec![],
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        let line = |cells: &[String]| {
            widths
                .iter()
                .enumerate()
                .map(|(i, w)| format!("{:>w$}", cells.get(i).map_or("", |c| c.as_str()), w = w))
                .collect::<Vec<_>>()
                .join("  ")
        };

        let total = widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * 2;
        let mut out = String::new();
        out.push_str(&line(&self.headers));
        out.push('\n');
        out.push_str(&"─".repeat(total));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&line(row));
            out.push('\n');
        }
        out
    }
}

/// Trim trailing zeros for display
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Signed percentage with two decimals, e.g. "+10.00%"
pub fn format_percent(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    if rounded > Decimal::ZERO {
        format!("+{:.2}%", rounded)
    } else {
        format!("{:.2}%", rounded)
    }
}

/// Coarse relative time, e.g. "3 days ago"
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 0 {
        return "in the future".to_string();
    }
    let minutes = secs / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    let plural = |n: i64, unit: &str| {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };

    if secs < 60 {
        "less than a minute ago".to_string()
    } else if minutes < 60 {
        format!("{} ago", plural(minutes, "minute"))
    } else if hours < 24 {
        format!("about {} ago", plural(hours, "hour"))
    } else if days < 30 {
        format!("{} ago", plural(days, "day"))
    } else if days < 365 {
        format!("{} ago", plural(days / 30, "month"))
    } else {
        format!("about {} ago", plural(days / 365, "year"))
    }
}

/// Currency and balance per account
pub fn balances_table(accounts: &[&Account]) -> String {
    let mut table = Table::new(&["currency", "balance"]);
    for account in accounts {
        table.push_row(vec![
            account.currency.clone(),
            format_decimal(account.balance),
        ]);
    }
    table.render()
}

/// Identifier and funds of a single account
pub fn account_table(account: &Account) -> String {
    let mut table = Table::new(&["id", "hold", "available"]);
    table.push_row(vec![
        account.id.clone(),
        format_decimal(account.hold),
        format_decimal(account.available),
    ]);
    table.render()
}

/// Every fill of a history, in fetched order
pub fn fills_table(history: &FillHistory) -> String {
    let mut table = Table::new(&[
        "created_at",
        "trade_id",
        "side",
        "price",
        "size",
        "fee",
        "usd_volume",
    ]);
    for fill in history {
        table.push_row(vec![
            fill.created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            fill.trade_id.clone(),
            fill.side.to_string(),
            format_decimal(fill.price),
            format_decimal(fill.size),
            format_decimal(fill.fee),
            format_decimal(fill.quote_volume),
        ]);
    }
    table.render()
}

/// Buy/sell aggregates with the optional market comparison column
pub fn summary_table(summary: &FillSummary, deltas: &[(Side, Decimal)]) -> String {
    let mut table = Table::new(&[
        "side", "fills", "quantity", "fee", "volume", "avg cost", "vs market",
    ]);
    for side in [Side::Buy, Side::Sell] {
        let delta = deltas
            .iter()
            .find(|(s, _)| *s == side)
            .map(|(_, d)| format_percent(*d))
            .unwrap_or_else(|| "-".to_string());
        match summary.get(side) {
            Some(stat) => table.push_row(stat_row(stat, delta)),
            None => table.push_row(vec![
                side.to_string(),
                "0".to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                "no trades".to_string(),
                "-".to_string(),
            ]),
        }
    }
    table.render()
}

fn stat_row(stat: &AggregateStat, delta: String) -> Vec<String> {
    vec![
        stat.side.to_string(),
        stat.fill_count.to_string(),
        format_decimal(stat.quantity),
        format_decimal(stat.fee),
        format_decimal(stat.volume),
        format_decimal(stat.average_cost.round_dp(8)),
        delta,
    ]
}

/// One colored sentence on where the market sits relative to an average
///
/// A market above the buy average is good for the holder; a market above the
/// sell average means coins were sold below today's price.
pub fn verdict_line(side: Side, average: Decimal, market_price: Decimal, delta: Decimal) -> String {
    let direction = if delta >= Decimal::ZERO { "above" } else { "below" };
    let text = format!(
        "Market {} is {} {} your average {} price {}",
        format_decimal(market_price),
        format_percent(delta.abs()).trim_start_matches('+'),
        direction,
        side,
        format_decimal(average.round_dp(8)),
    );
    let favourable = match side {
        Side::Buy => delta >= Decimal::ZERO,
        Side::Sell => delta <= Decimal::ZERO,
    };
    if favourable {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

/// Prints "Fetched N fills..." after every page
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn on_page(&self, product_id: &str, fetched: usize, has_more: bool) {
        eprintln!(
            "{}: fetched {} fills{}",
            product_id,
            fetched,
            if has_more { "..." } else { "." }
        );
    }
}
