//! asin-harvest - Batch ASIN field harvester for Amazon product pages
//!
//! Fetches product detail pages for a list of ASINs, extracts one field per
//! run (brand, primary image, or price) through fixed selector strategies,
//! and files every identifier into a four-class run ledger.

pub mod amazon;
pub mod commands;
pub mod config;
pub mod harvest;
pub mod input;
pub mod report;
pub mod sink;

pub use amazon::Region;
pub use config::Config;
pub use harvest::{Field, Outcome, RunLedger};
