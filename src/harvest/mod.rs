//! Batch harvesting: worker, pool, and run ledger.

pub mod ledger;
pub mod outcome;
pub mod runner;
pub mod worker;

pub use ledger::RunLedger;
pub use outcome::{Field, HardReason, Harvested, Outcome, SoftReason};
pub use runner::Harvester;
pub use worker::harvest_one;
