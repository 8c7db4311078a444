//! Coupon Catalog
//!
//! Coupon Catalog normalises raw coupon records from several sources into one
//! catalog and serves deduplicated, filtered and sorted views over it.

pub mod catalog;
pub mod config;
pub mod coupons;
pub mod dedup;
pub mod filter;
pub mod ingest;
pub mod listing;
pub mod logging;
pub mod prelude;
pub mod sorting;
pub mod tags;
pub mod time;
pub mod titles;
pub mod users;
pub mod views;
