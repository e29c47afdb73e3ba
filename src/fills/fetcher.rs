//! Cursor-paginated fill retrieval
//!
//! Drains the exchange's fill endpoint for one product page by page. Each
//! request depends on the cursor of the previous response, so pages for a
//! single product are always fetched sequentially. Independent products can
//! be fetched concurrently through [`PaginatedFetcher::fetch_many`].

use super::types::{FillError, FillHistory, FillPage, PageCursor};
use crate::telemetry::{increment_counter, record_latency, CounterMetric, LatencyMetric};
use async_trait::async_trait;
use futures_util::future::FutureExt;
use futures_util::stream::{self, StreamExt};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};

/// Page size used by the exchange fill endpoint
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Source of fill pages for a product
#[async_trait]
pub trait FillSource: Send + Sync {
    /// Request one page of at most `limit` fills, starting after `after`
    async fn fetch_page(
        &self,
        product_id: &str,
        after: Option<&PageCursor>,
        limit: usize,
    ) -> Result<FillPage, FillError>;
}

#[async_trait]
impl<T: FillSource + ?Sized> FillSource for Arc<T> {
    async fn fetch_page(
        &self,
        product_id: &str,
        after: Option<&PageCursor>,
        limit: usize,
    ) -> Result<FillPage, FillError> {
        (**self).fetch_page(product_id, after, limit).await
    }
}

/// Receives a notification after every fetched page
pub trait ProgressObserver: Send + Sync {
    fn on_page(&self, product_id: &str, fetched: usize, has_more: bool);
}

/// Observer that only logs progress
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_page(&self, product_id: &str, fetched: usize, has_more: bool) {
        tracing::debug!(product_id, fetched, has_more, "Fetched fill page");
    }
}

/// Fetcher configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Fills requested per page
    pub page_size: usize,
    /// Timeout applied to each page request
    pub request_timeout: Duration,
    /// Retries after a network failure (0 = no retry)
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for the doubling retry delay
    pub max_backoff: Duration,
    /// Products fetched at the same time by `fetch_many`
    pub max_concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(10),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            max_concurrency: 4,
        }
    }
}

impl FetchConfig {
    /// Set page size
    pub fn page_size(mut self, n: usize) -> Self {
        self.page_size = n.max(1);
        self
    }

    /// Set per-request timeout
    pub fn request_timeout(mut self, d: Duration) -> Self {
        self.request_timeout = d;
        self
    }

    /// Set maximum retries per page
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set initial and maximum retry delay
    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max.max(initial);
        self
    }

    /// Set concurrent product limit
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }
}

/// State of a single product's pagination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    /// More pages to request; `after` is `None` only before the first page
    Fetching { after: Option<PageCursor> },
    /// A short page was received
    Done,
    /// Terminal failure
    Error(FillError),
}

impl FetchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FetchState::Fetching { .. })
    }
}

/// Tracks cursors and decides the next state after each page
#[derive(Debug)]
pub struct Pagination {
    limit: usize,
    seen: HashSet<PageCursor>,
    state: FetchState,
    pages: usize,
}

impl Pagination {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            seen: HashSet::new(),
            state: FetchState::Fetching { after: None },
            pages: 0,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// Pages accounted for so far
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Apply a received page. Terminal states are left untouched.
    ///
    /// A short page ends the stream whatever cursor it carries. A full page
    /// must carry a cursor that has not been followed before.
    pub fn advance(&mut self, page_len: usize, after: Option<PageCursor>) -> &FetchState {
        if self.state.is_terminal() {
            return &self.state;
        }
        self.pages += 1;

        if page_len < self.limit {
            self.state = FetchState::Done;
            return &self.state;
        }

        self.state = match after {
            Some(cursor) if !self.seen.insert(cursor.clone()) => {
                FetchState::Error(FillError::Protocol(format!(
                    "cursor {} repeated on page {}",
                    cursor, self.pages
                )))
            }
            Some(cursor) => FetchState::Fetching {
                after: Some(cursor),
            },
            None => FetchState::Error(FillError::Protocol(format!(
                "full page {} returned without a cursor",
                self.pages
            ))),
        };
        &self.state
    }

    /// Move to the error state after a failed request
    pub fn fail(&mut self, err: FillError) {
        if !self.state.is_terminal() {
            self.state = FetchState::Error(err);
        }
    }
}

/// Retrieves complete fill histories from a [`FillSource`]
pub struct PaginatedFetcher<S> {
    source: S,
    config: FetchConfig,
    observer: Arc<dyn ProgressObserver>,
}

impl<S: FillSource> PaginatedFetcher<S> {
    /// Create a fetcher with default configuration
    pub fn new(source: S) -> Self {
        Self::with_config(source, FetchConfig::default())
    }

    /// Create a fetcher with custom configuration
    pub fn with_config(source: S, config: FetchConfig) -> Self {
        Self {
            source,
            config,
            observer: Arc::new(LogProgress),
        }
    }

    /// Replace the progress observer
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch every fill for `product_id`, in the order the exchange returns them
    ///
    /// Either the whole history is returned or an error; pages collected
    /// before a failure are dropped.
    pub async fn fetch_all(&self, product_id: &str) -> Result<FillHistory, FillError> {
        let started = Instant::now();
        let mut pagination = Pagination::new(self.config.page_size);
        let mut fills = Vec::new();

        loop {
            let after = match pagination.state() {
                FetchState::Fetching { after } => after.clone(),
                FetchState::Done => break,
                FetchState::Error(e) => {
                    increment_counter(CounterMetric::FetchFailures, product_id, 1);
                    tracing::warn!(product_id, error = %e, "Fill fetch failed");
                    return Err(e.clone());
                }
            };

            let page = match self.fetch_page_with_retry(product_id, after.as_ref()).await {
                Ok(page) => page,
                Err(e) => {
                    pagination.fail(e);
                    continue;
                }
            };

            let page_len = page.len();
            fills.extend(page.fills);
            let state = pagination.advance(page_len, page.after);

            increment_counter(CounterMetric::PagesFetched, product_id, 1);
            increment_counter(CounterMetric::FillsFetched, product_id, page_len as u64);

            if !matches!(state, FetchState::Error(_)) {
                let has_more = !state.is_terminal();
                self.observer.on_page(product_id, fills.len(), has_more);
            }
        }

        record_latency(LatencyMetric::FullFetch, started.elapsed());
        tracing::info!(
            product_id,
            fills = fills.len(),
            pages = pagination.pages(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched fill history"
        );

        Ok(FillHistory::new(product_id, fills))
    }

    /// Fetch a history, giving up as soon as `cancel` completes
    ///
    /// Used to impose deadlines or react to a user interrupt. Cancellation
    /// never yields a partial history.
    pub async fn fetch_all_until<F>(
        &self,
        product_id: &str,
        cancel: F,
    ) -> Result<FillHistory, FillError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                tracing::warn!(product_id, "Fill fetch cancelled, discarding partial pages");
                Err(FillError::Cancelled(format!("fetch of {} aborted", product_id)))
            }
            result = self.fetch_all(product_id) => result,
        }
    }

    /// Fetch several products concurrently, bounded by `max_concurrency`
    ///
    /// Results come back in input order. A failing product does not affect
    /// the others.
    pub async fn fetch_many(
        &self,
        product_ids: &[String],
    ) -> Vec<(String, Result<FillHistory, FillError>)> {
        self.fetch_many_until(product_ids, std::future::pending())
            .await
    }

    /// [`fetch_many`](Self::fetch_many) with one cancel signal for the batch
    ///
    /// Once `cancel` completes, every product still running or waiting for a
    /// slot ends with `Cancelled`. Histories finished before that are kept.
    pub async fn fetch_many_until<F>(
        &self,
        product_ids: &[String],
        cancel: F,
    ) -> Vec<(String, Result<FillHistory, FillError>)>
    where
        F: Future<Output = ()>,
    {
        let cancel = cancel.shared();
        stream::iter(product_ids.iter().cloned())
            .map(|product_id| {
                let cancel = cancel.clone();
                async move {
                    let result = self.fetch_all_until(&product_id, cancel).await;
                    (product_id, result)
                }
            })
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await
    }

    /// One page request with timeout and exponential backoff on network errors
    async fn fetch_page_with_retry(
        &self,
        product_id: &str,
        after: Option<&PageCursor>,
    ) -> Result<FillPage, FillError> {
        let mut attempt = 0u32;
        let mut backoff = self.config.initial_backoff;

        loop {
            let started = Instant::now();
            let request = self
                .source
                .fetch_page(product_id, after, self.config.page_size);
            let result = match timeout(self.config.request_timeout, request).await {
                Ok(result) => result,
                Err(_) => Err(FillError::timeout(self.config.request_timeout)),
            };
            record_latency(LatencyMetric::PageRequest, started.elapsed());

            match result {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    increment_counter(CounterMetric::RequestRetries, product_id, 1);
                    tracing::warn!(
                        product_id,
                        error = %e,
                        attempt,
                        max_retries = self.config.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "Page request failed, retrying..."
                    );
                    sleep(backoff).await;
                    backoff = (backoff * 2).min(self.config.max_backoff);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
