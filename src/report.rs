//! End-of-run summary rendering.

use crate::config::OutputFormat;
use crate::harvest::ledger::RunLedger;
use crate::harvest::outcome::Field;
use serde::Serialize;
use std::time::Duration;

/// Per-class counts for one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub field: Field,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub crashed: usize,
    pub unprocessed: usize,
    pub elapsed_secs: u64,
}

impl RunSummary {
    pub fn new(field: Field, ledger: &RunLedger, elapsed: Duration) -> Self {
        Self {
            field,
            total: ledger.total(),
            successful: ledger.successful().len(),
            failed: ledger.failed().len(),
            crashed: ledger.crashed().len(),
            unprocessed: ledger.unprocessed().len(),
            elapsed_secs: elapsed.as_secs(),
        }
    }

    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => self.table(),
            OutputFormat::Json => {
                serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
            }
        }
    }

    fn table(&self) -> String {
        let minutes = self.elapsed_secs / 60;
        let seconds = self.elapsed_secs % 60;

        let mut lines = Vec::new();
        lines.push(format!("Field:        {}", self.field));
        lines.push(format!("Total:        {}", self.total));
        lines.push(format!("Successful:   {}", self.successful));
        lines.push(format!("Failed:       {}", self.failed));
        lines.push(format!("Crashed:      {}", self.crashed));
        lines.push(format!("Unprocessed:  {}", self.unprocessed));
        lines.push(format!("Elapsed:      {} min {} sec", minutes, seconds));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::outcome::{Harvested, Outcome, SoftReason};

    fn make_ledger() -> RunLedger {
        let mut ledger = RunLedger::new();
        ledger.record("A000000001", &Outcome::Success(Harvested::Text("x".into())));
        ledger.record("A000000002", &Outcome::Soft(SoftReason::Blocked));
        ledger.finalize(&[
            "A000000001".to_string(),
            "A000000002".to_string(),
            "A000000003".to_string(),
        ]);
        ledger
    }

    #[test]
    fn test_summary_counts() {
        let summary = RunSummary::new(Field::Brand, &make_ledger(), Duration::from_secs(95));
        assert_eq!(summary.total, 3);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.crashed, 0);
        assert_eq!(summary.unprocessed, 1);
    }

    #[test]
    fn test_table_render() {
        let summary = RunSummary::new(Field::Price, &make_ledger(), Duration::from_secs(95));
        let output = summary.render(OutputFormat::Table);

        assert!(output.contains("Field:        price"));
        assert!(output.contains("Successful:   1"));
        assert!(output.contains("Unprocessed:  1"));
        assert!(output.contains("Elapsed:      1 min 35 sec"));
    }

    #[test]
    fn test_json_render() {
        let summary = RunSummary::new(Field::Image, &make_ledger(), Duration::from_secs(5));
        let output = summary.render(OutputFormat::Json);

        assert!(output.starts_with('{'));
        assert!(output.contains("\"field\": \"image\""));
        assert!(output.contains("\"successful\": 1"));
    }
}
