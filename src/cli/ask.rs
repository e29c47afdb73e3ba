//! Ask command implementation

use super::stats::report;
use super::Context;
use crate::account::AccountSnapshot;
use crate::fills::FillError;
use clap::Args;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Args, Debug, Default)]
pub struct AskArgs {
    /// Print every fill before the summary
    #[arg(long)]
    pub show_fills: bool,
}

impl AskArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let snapshot = ctx.snapshot().await?;
        println!("{} accounts", snapshot.len());

        let coins = snapshot.coins();
        if coins.is_empty() {
            println!("No traded coins in this profile");
            return Ok(());
        }

        let mut lines = BufReader::new(io::stdin()).lines();
        loop {
            print_menu(&coins);
            let mut stdout = io::stdout();
            stdout.write_all(b"Which coin? ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                return Ok(());
            };
            let choice = line.trim();
            if choice.is_empty() {
                continue;
            }

            let coin = pick(&snapshot, &coins, choice);
            match snapshot.resolve(&coin) {
                Ok(_) => return report(ctx, &snapshot, &coin, self.show_fills).await,
                Err(e @ FillError::UnknownCoin(_)) => println!("{}", e),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn print_menu(coins: &[&str]) {
    for (i, coin) in coins.iter().enumerate() {
        println!("{:>3}) {}", i + 1, coin);
    }
}

/// Map a menu number or symbol to a coin symbol
fn pick(snapshot: &AccountSnapshot, coins: &[&str], choice: &str) -> String {
    match choice.parse::<usize>() {
        Ok(n) if n >= 1 && n <= coins.len() => coins[n - 1].to_string(),
        _ => snapshot
            .get(choice)
            .map(|a| a.currency.to_uppercase())
            .unwrap_or_else(|| choice.to_uppercase()),
    }
}
