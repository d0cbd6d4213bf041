//! CLI command implementations.

pub mod harvest;

pub use harvest::HarvestCommand;
