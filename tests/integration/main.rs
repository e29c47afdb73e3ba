//! Integration tests

mod e2e_test;
mod fetch_test;
mod stats_test;
