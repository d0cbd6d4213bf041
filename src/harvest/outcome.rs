//! Per-identifier outcome taxonomy.
//!
//! Every worker invocation returns exactly one [`Outcome`]. Soft failures are
//! properties of the target page; hard failures are the tooling breaking.
//! The driving loop files each into the matching run-ledger class.

use serde::Serialize;
use std::fmt;

/// Which product field a run harvests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Brand,
    Image,
    Price,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Brand => write!(f, "brand"),
            Field::Image => write!(f, "image"),
            Field::Price => write!(f, "price"),
        }
    }
}

/// A successfully extracted value, handed to the sink for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Harvested {
    /// Brand or price text, recorded verbatim.
    Text(String),
    /// Downloaded image bytes, written to `<asin>.jpg`.
    Image { url: String, bytes: Vec<u8> },
}

/// Target-page condition: the page can't be harvested, the tooling is fine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoftReason {
    /// Page load exceeded the bounded wait.
    Timeout,
    /// Robot check, CAPTCHA, or access-denied interstitial.
    Blocked,
    /// No selector strategy yielded a non-empty value.
    NotFound,
    /// A strategy matched but produced a placeholder value.
    Placeholder,
    /// Non-success HTTP status from the product page.
    Http(u16),
    /// Transport-level failure reaching the site.
    Transport,
    /// Secondary fetch of a discovered value (image bytes) failed.
    Download,
}

impl fmt::Display for SoftReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoftReason::Timeout => write!(f, "timeout"),
            SoftReason::Blocked => write!(f, "blocked"),
            SoftReason::NotFound => write!(f, "not found"),
            SoftReason::Placeholder => write!(f, "placeholder"),
            SoftReason::Http(status) => write!(f, "http {}", status),
            SoftReason::Transport => write!(f, "transport"),
            SoftReason::Download => write!(f, "download"),
        }
    }
}

/// Tooling/environment condition, isolated to the failing worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardReason {
    /// Session construction failed.
    Session(String),
    /// Writing the output artifact failed.
    Persist(String),
    /// The worker task died without reporting (panic or abort).
    Task(String),
}

impl fmt::Display for HardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardReason::Session(msg) => write!(f, "session: {}", msg),
            HardReason::Persist(msg) => write!(f, "persist: {}", msg),
            HardReason::Task(msg) => write!(f, "task: {}", msg),
        }
    }
}

/// The tagged result of one worker invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Harvested),
    Soft(SoftReason),
    Hard(HardReason),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}
