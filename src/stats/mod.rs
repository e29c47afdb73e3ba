//! Cost basis statistics
//!
//! Pure, synchronous reductions over a complete [`FillHistory`](crate::fills::FillHistory).
//! All arithmetic is done in `Decimal`; nothing passes through `f64`.

mod aggregate;
mod compare;

pub use aggregate::{aggregate, summarize, AggregateStat, FillSummary};
pub use compare::percent_delta;
