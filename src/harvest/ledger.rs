//! Run ledger: outcome classes accumulated across all workers.

use crate::harvest::outcome::Outcome;
use crate::sink::write_lines;
use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

pub const SUCCESSFUL_FILE: &str = "successful_asins.txt";
pub const FAILED_FILE: &str = "failed_asins.txt";
pub const CRASHED_FILE: &str = "crashed_asins.txt";
pub const MISSING_FILE: &str = "missing_asins.txt";

/// Four disjoint-by-construction identifier classes.
///
/// Owned by the single collector loop; workers never touch it. Each recorded
/// identifier lands in exactly one class, and `finalize` accounts for every
/// input identifier that no worker reported.
#[derive(Debug, Default)]
pub struct RunLedger {
    successful: Vec<String>,
    failed: Vec<String>,
    crashed: Vec<String>,
    unprocessed: Vec<String>,
}

impl RunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files one outcome into its class.
    pub fn record(&mut self, asin: &str, outcome: &Outcome) {
        match outcome {
            Outcome::Success(_) => self.successful.push(asin.to_string()),
            Outcome::Soft(_) => self.failed.push(asin.to_string()),
            Outcome::Hard(_) => self.crashed.push(asin.to_string()),
        }
    }

    /// Computes the unprocessed class: input identifiers no worker reported.
    /// Call once, after all dispatched work has completed.
    pub fn finalize(&mut self, input: &[String]) {
        let processed: HashSet<&str> = self
            .successful
            .iter()
            .chain(self.failed.iter())
            .chain(self.crashed.iter())
            .map(String::as_str)
            .collect();

        let mut seen_missing = HashSet::new();
        self.unprocessed = input
            .iter()
            .filter(|asin| !processed.contains(asin.as_str()))
            .filter(|asin| seen_missing.insert(asin.as_str()))
            .cloned()
            .collect();
    }

    pub fn successful(&self) -> &[String] {
        &self.successful
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    pub fn crashed(&self) -> &[String] {
        &self.crashed
    }

    pub fn unprocessed(&self) -> &[String] {
        &self.unprocessed
    }

    /// Total identifiers accounted for across all classes.
    pub fn total(&self) -> usize {
        self.successful.len() + self.failed.len() + self.crashed.len() + self.unprocessed.len()
    }

    /// Writes one line-delimited file per non-empty class.
    pub async fn write(&self, dir: &Path) -> Result<()> {
        for (name, class) in [
            (SUCCESSFUL_FILE, &self.successful),
            (FAILED_FILE, &self.failed),
            (CRASHED_FILE, &self.crashed),
            (MISSING_FILE, &self.unprocessed),
        ] {
            if class.is_empty() {
                continue;
            }
            let path = dir.join(name);
            write_lines(&path, class).await?;
            info!("Wrote {} identifiers to {}", class.len(), path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::outcome::{HardReason, Harvested, SoftReason};
    use tempfile::tempdir;

    fn success() -> Outcome {
        Outcome::Success(Harvested::Text("value".to_string()))
    }

    #[test]
    fn test_record_classes() {
        let mut ledger = RunLedger::new();
        ledger.record("A000000001", &success());
        ledger.record("A000000002", &Outcome::Soft(SoftReason::NotFound));
        ledger.record("A000000003", &Outcome::Hard(HardReason::Task("gone".into())));

        assert_eq!(ledger.successful(), &["A000000001"]);
        assert_eq!(ledger.failed(), &["A000000002"]);
        assert_eq!(ledger.crashed(), &["A000000003"]);
    }

    #[test]
    fn test_finalize_partitions_input() {
        let input: Vec<String> =
            ["A000000001", "A000000002", "A000000003", "A000000004"].map(String::from).into();

        let mut ledger = RunLedger::new();
        ledger.record("A000000001", &success());
        ledger.record("A000000002", &Outcome::Soft(SoftReason::Blocked));
        ledger.record("A000000003", &Outcome::Hard(HardReason::Session("boom".into())));
        ledger.finalize(&input);

        assert_eq!(ledger.unprocessed(), &["A000000004"]);
        assert_eq!(ledger.total(), input.len());

        // Partition: every input identifier in exactly one class.
        let mut all: Vec<&String> = ledger
            .successful()
            .iter()
            .chain(ledger.failed())
            .chain(ledger.crashed())
            .chain(ledger.unprocessed())
            .collect();
        all.sort();
        let mut expected: Vec<&String> = input.iter().collect();
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_finalize_empty_when_all_processed() {
        let input: Vec<String> = vec!["A000000001".to_string()];
        let mut ledger = RunLedger::new();
        ledger.record("A000000001", &success());
        ledger.finalize(&input);
        assert!(ledger.unprocessed().is_empty());
    }

    #[test]
    fn test_finalize_dedupes_missing() {
        let input: Vec<String> = vec!["A000000001".to_string(), "A000000001".to_string()];
        let mut ledger = RunLedger::new();
        ledger.finalize(&input);
        assert_eq!(ledger.unprocessed(), &["A000000001"]);
    }

    #[tokio::test]
    async fn test_write_skips_empty_classes() {
        let dir = tempdir().unwrap();
        let mut ledger = RunLedger::new();
        ledger.record("A000000001", &success());
        ledger.finalize(&["A000000001".to_string()]);

        ledger.write(dir.path()).await.unwrap();

        assert!(dir.path().join(SUCCESSFUL_FILE).exists());
        assert!(!dir.path().join(FAILED_FILE).exists());
        assert!(!dir.path().join(CRASHED_FILE).exists());
        assert!(!dir.path().join(MISSING_FILE).exists());

        let content = std::fs::read_to_string(dir.path().join(SUCCESSFUL_FILE)).unwrap();
        assert_eq!(content, "A000000001\n");
    }

    #[tokio::test]
    async fn test_write_all_classes() {
        let dir = tempdir().unwrap();
        let mut ledger = RunLedger::new();
        ledger.record("A000000001", &success());
        ledger.record("A000000002", &Outcome::Soft(SoftReason::Timeout));
        ledger.record("A000000003", &Outcome::Hard(HardReason::Task("lost".into())));
        ledger.finalize(&[
            "A000000001".to_string(),
            "A000000002".to_string(),
            "A000000003".to_string(),
            "A000000004".to_string(),
        ]);

        ledger.write(dir.path()).await.unwrap();

        for name in [SUCCESSFUL_FILE, FAILED_FILE, CRASHED_FILE, MISSING_FILE] {
            assert!(dir.path().join(name).exists(), "missing {}", name);
        }
    }
}
