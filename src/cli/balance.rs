//! Balance command implementation

use super::render;
use super::Context;
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Hide accounts at or below this balance (defaults to display.min_balance)
    #[arg(long)]
    pub min: Option<Decimal>,
}

impl BalanceArgs {
    pub async fn execute(&self, ctx: &Context) -> anyhow::Result<()> {
        let snapshot = ctx.snapshot().await?;
        let min = self.min.unwrap_or(ctx.config.display.min_balance);
        let accounts = snapshot.positive_balances(min);

        if accounts.is_empty() {
            println!("No account holds more than {}", render::format_decimal(min));
            return Ok(());
        }

        println!("{}", render::balances_table(&accounts));
        Ok(())
    }
}
