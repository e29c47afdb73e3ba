//! Fill history retrieval
//!
//! Types for executed trade legs and the paginated fetcher that drains an
//! exchange's fill endpoint into a complete [`FillHistory`].

mod fetcher;
mod types;

pub use fetcher::{
    FetchConfig, FetchState, FillSource, LogProgress, PaginatedFetcher, Pagination,
    ProgressObserver, DEFAULT_PAGE_SIZE,
};
pub use types::{Fill, FillError, FillHistory, FillPage, PageCursor, Side};
