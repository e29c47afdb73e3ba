//! Account holdings
//!
//! The account list is fetched once per command and frozen into an
//! [`AccountSnapshot`] that is passed to whoever needs it. Resolving a coin
//! symbol to a product id goes through the snapshot, keeping interactive coin
//! selection apart from the fetch/aggregate pipeline.

use crate::fills::FillError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One currency account from `GET /accounts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub currency: String,
    pub balance: Decimal,
    pub available: Decimal,
    pub hold: Decimal,
}

/// A coin resolved against the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCoin<'a> {
    pub account: &'a Account,
    /// Trading pair against the quote currency, e.g. "ETH-USD"
    pub product_id: String,
}

/// Immutable view of the account list, keyed by currency
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    accounts: BTreeMap<String, Account>,
    quote_currency: String,
}

impl AccountSnapshot {
    pub fn new(accounts: Vec<Account>, quote_currency: impl Into<String>) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|a| (a.currency.to_uppercase(), a))
            .collect();
        Self {
            accounts,
            quote_currency: quote_currency.into().to_uppercase(),
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn quote_currency(&self) -> &str {
        &self.quote_currency
    }

    pub fn get(&self, currency: &str) -> Option<&Account> {
        self.accounts.get(&currency.trim().to_uppercase())
    }

    /// Currencies that can be traded against the quote currency, sorted
    pub fn coins(&self) -> Vec<&str> {
        self.accounts
            .keys()
            .filter(|c| **c != self.quote_currency)
            .map(String::as_str)
            .collect()
    }

    /// Accounts holding more than `min_balance`, sorted by currency
    pub fn positive_balances(&self, min_balance: Decimal) -> Vec<&Account> {
        self.accounts
            .values()
            .filter(|a| a.balance > min_balance)
            .collect()
    }

    /// Resolve a user-typed symbol such as "eth" into its account and product
    pub fn resolve(&self, coin: &str) -> Result<ResolvedCoin<'_>, FillError> {
        let symbol = coin.trim().to_uppercase();
        if symbol.is_empty() || symbol == self.quote_currency {
            return Err(FillError::UnknownCoin(symbol));
        }
        let account = self
            .accounts
            .get(&symbol)
            .ok_or_else(|| FillError::UnknownCoin(symbol.clone()))?;

        Ok(ResolvedCoin {
            product_id: format!("{}-{}", symbol, self.quote_currency),
            account,
        })
    }
}
