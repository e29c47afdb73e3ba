//! CLI interface for cbp-stats
//!
//! Provides subcommands for:
//! - `balance`: List accounts with a positive balance
//! - `ask`: Pick a coin from a prompt, then report on it
//! - `stats`: Fill history and cost basis for one coin
//! - `compare`: Cost basis summary for several coins at once
//! - `config`: Show the effective configuration

mod ask;
mod balance;
mod compare;
pub mod render;
mod stats;

pub use ask::AskArgs;
pub use balance::BalanceArgs;
pub use compare::CompareArgs;
pub use stats::StatsArgs;

use crate::account::AccountSnapshot;
use crate::api::{Credentials, ExchangeClient};
use crate::config::Config;
use crate::fills::{FillError, FillHistory, PaginatedFetcher, ProgressObserver};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "cbp-stats")]
#[command(about = "Trade history and cost basis statistics for exchange accounts")]
#[command(version)]
pub struct Cli {
    /// Defaults to `ask` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List your positive balance accounts
    #[command(alias = "list")]
    Balance(BalanceArgs),
    /// Choose a coin from your accounts
    Ask(AskArgs),
    /// Compute averages for a coin
    Stats(StatsArgs),
    /// Summarize several coins concurrently
    Compare(CompareArgs),
    /// Show configuration
    Config,
}

/// Shared state for one command invocation
pub struct Context {
    pub config: Config,
    pub client: Arc<ExchangeClient>,
}

impl Context {
    /// Build the exchange client from config and environment credentials
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let credentials = Credentials::from_env()?;
        let client = ExchangeClient::with_config(
            config.exchange.to_exchange_config(),
            Some(credentials),
        )?;
        Ok(Self {
            config,
            client: Arc::new(client),
        })
    }

    /// Fetch the account list once and freeze it
    pub async fn snapshot(&self) -> anyhow::Result<AccountSnapshot> {
        let accounts = self.client.list_accounts().await?;
        let snapshot = AccountSnapshot::new(accounts, &self.config.exchange.quote_currency);
        tracing::info!(accounts = snapshot.len(), "Loaded account snapshot");
        Ok(snapshot)
    }

    pub fn fetcher(
        &self,
        observer: Arc<dyn ProgressObserver>,
    ) -> PaginatedFetcher<Arc<ExchangeClient>> {
        PaginatedFetcher::with_config(self.client.clone(), self.config.fetch.to_fetch_config())
            .with_observer(observer)
    }

    /// Fetch one history, aborting on Ctrl-C or when `max_fetch_secs` elapses
    pub async fn fetch_history(
        &self,
        fetcher: &PaginatedFetcher<Arc<ExchangeClient>>,
        product_id: &str,
    ) -> Result<FillHistory, FillError> {
        let deadline = self.config.fetch.max_fetch_duration();
        fetcher
            .fetch_all_until(product_id, interrupted(deadline))
            .await
    }

    /// Fetch several histories under one Ctrl-C / `max_fetch_secs` bound
    pub async fn fetch_histories(
        &self,
        fetcher: &PaginatedFetcher<Arc<ExchangeClient>>,
        product_ids: &[String],
    ) -> Vec<(String, Result<FillHistory, FillError>)> {
        let deadline = self.config.fetch.max_fetch_duration();
        fetcher
            .fetch_many_until(product_ids, interrupted(deadline))
            .await
    }
}

/// Completes on Ctrl-C or after `deadline`, whichever comes first
fn interrupted(deadline: Option<std::time::Duration>) -> impl Future<Output = ()> {
    async move {
        let timer = async {
            match deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = timer => {}
        }
    }
}
