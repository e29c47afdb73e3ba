//! REST client for the exchange API
//!
//! Lists accounts, fetches tickers and serves fill pages to the
//! [`PaginatedFetcher`](crate::fills::PaginatedFetcher). The fill endpoint
//! returns a JSON array; the cursor for the next page arrives in the
//! `CB-AFTER` response header.

use super::auth::{Credentials, Signer};
use super::types::{ApiErrorBody, RawFill, Ticker};
use crate::account::Account;
use crate::fills::{Fill, FillError, FillPage, FillSource, PageCursor};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Exchange REST base URL
pub const EXCHANGE_API_URL: &str = "https://api.exchange.coinbase.com";

/// Response header carrying the cursor for older fills
pub const AFTER_HEADER: &str = "cb-after";

/// Configuration for the exchange client
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Base URL for the REST API
    pub base_url: String,
    /// Transport-level timeout for a single HTTP request
    pub timeout: Duration,
    /// User agent sent with every request (the API rejects requests without one)
    pub user_agent: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: EXCHANGE_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("cbp-stats/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Client for the exchange REST API
pub struct ExchangeClient {
    config: ExchangeConfig,
    client: Client,
    signer: Option<Signer>,
}

impl ExchangeClient {
    /// Create a client against the public API
    pub fn new(credentials: Option<Credentials>) -> Result<Self, FillError> {
        Self::with_config(ExchangeConfig::default(), credentials)
    }

    /// Create a client with custom configuration
    ///
    /// Without credentials requests are sent unsigned, which only works for
    /// public endpoints such as tickers.
    pub fn with_config(
        config: ExchangeConfig,
        credentials: Option<Credentials>,
    ) -> Result<Self, FillError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FillError::Config(format!("failed to create HTTP client: {}", e)))?;
        let signer = credentials.map(Signer::new).transpose()?;

        Ok(Self {
            config,
            client,
            signer,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.signer.is_some()
    }

    /// List every currency account of the profile
    pub async fn list_accounts(&self) -> Result<Vec<Account>, FillError> {
        let response = self.get("/accounts", &[]).await?;
        let accounts: Vec<Account> = decode(response).await?;
        tracing::debug!(accounts = accounts.len(), "Fetched accounts");
        Ok(accounts)
    }

    /// Latest trade price and book top for a product
    pub async fn get_ticker(&self, product_id: &str) -> Result<Ticker, FillError> {
        let path = format!("/products/{}/ticker", product_id);
        let response = self.get(&path, &[]).await?;
        decode(response).await
    }

    /// Build, sign and send a GET request, mapping failures onto [`FillError`]
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response, FillError> {
        let mut url = Url::parse(&format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            path
        ))
        .map_err(|e| FillError::Config(format!("invalid URL for {}: {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let request_path = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        };

        tracing::debug!(path = %request_path, "Sending request");

        let mut request = self.client.get(url.clone());
        if let Some(signer) = &self.signer {
            let timestamp = Utc::now().timestamp().to_string();
            for (name, value) in signer.headers(&timestamp, "GET", &request_path, "")? {
                request = request.header(name, value);
            }
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);

        if is_transient(status) {
            Err(FillError::Network(format!(
                "HTTP {} from {}: {}",
                status.as_u16(),
                request_path,
                message
            )))
        } else {
            Err(FillError::Rejected {
                status: status.as_u16(),
                body: message,
            })
        }
    }
}

#[async_trait]
impl FillSource for ExchangeClient {
    async fn fetch_page(
        &self,
        product_id: &str,
        after: Option<&PageCursor>,
        limit: usize,
    ) -> Result<FillPage, FillError> {
        let limit = limit.to_string();
        let mut query = vec![("product_id", product_id), ("limit", limit.as_str())];
        if let Some(cursor) = after {
            query.push(("after", cursor.as_str()));
        }

        let response = self.get("/fills", &query).await?;
        let next = response
            .headers()
            .get(AFTER_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(PageCursor::new);

        let raw: Vec<RawFill> = decode(response).await?;
        let fills = raw
            .into_iter()
            .map(Fill::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FillPage::new(fills, next))
    }
}

/// Rate limiting and server-side failures are worth retrying
fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn map_transport_error(e: reqwest::Error) -> FillError {
    if e.is_decode() {
        FillError::Protocol(format!("failed to read response: {}", e))
    } else {
        FillError::Network(e.to_string())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, FillError> {
    let body = response.text().await.map_err(map_transport_error)?;
    serde_json::from_str(&body)
        .map_err(|e| FillError::Protocol(format!("unexpected response body: {}", e)))
}
