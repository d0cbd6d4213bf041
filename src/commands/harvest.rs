//! Harvest run command: wires a field kind to its sink and the worker pool.

use crate::amazon::{Extractor, SessionFactory, WreqSessionFactory};
use crate::config::Config;
use crate::harvest::outcome::Field;
use crate::harvest::Harvester;
use crate::input::load_identifiers;
use crate::report::RunSummary;
use crate::sink::{ImageSink, RowSink, SnapshotWriter, ValueSink};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Executes one harvest run over an identifier list.
pub struct HarvestCommand {
    config: Config,
    field: Field,
    output: PathBuf,
}

impl HarvestCommand {
    /// Creates a command; `output` falls back to the field's conventional
    /// artifact path.
    pub fn new(config: Config, field: Field, output: Option<PathBuf>) -> Self {
        let output = output.unwrap_or_else(|| default_output(field));
        Self { config, field, output }
    }

    /// Runs the harvest with a production session factory.
    pub async fn execute(&self, input: &Path) -> Result<String> {
        let factory = Arc::new(WreqSessionFactory::new(self.config.clone()));
        self.execute_with_factory(factory, input).await
    }

    /// Runs the harvest with a provided factory (for testing).
    pub async fn execute_with_factory(
        &self,
        factory: Arc<dyn SessionFactory>,
        input: &Path,
    ) -> Result<String> {
        let asins = load_identifiers(input)?;
        info!("Harvesting {} for {} identifiers", self.field, asins.len());

        let sink: Arc<dyn ValueSink> = match self.field {
            Field::Brand => Arc::new(RowSink::new(&self.output, "asin,brand")),
            Field::Price => Arc::new(RowSink::new(&self.output, "asin,price")),
            Field::Image => {
                let image_sink = ImageSink::new(&self.output);
                image_sink.prepare().await?;
                Arc::new(image_sink)
            }
        };

        let snapshots = if self.config.snapshot_pages {
            SnapshotWriter::new(Some(self.config.snapshot_dir.clone()))
        } else {
            SnapshotWriter::disabled()
        };
        snapshots.prepare().await?;

        tokio::fs::create_dir_all(&self.config.ledger_dir)
            .await
            .context("Failed to create ledger directory")?;

        let harvester = Harvester::new(
            factory,
            Extractor::new(self.field),
            sink.clone(),
            snapshots,
            self.config.workers,
        );

        let started = Instant::now();
        let ledger = harvester.run(&asins, self.config.max_items).await;

        sink.finish().await?;
        ledger.write(&self.config.ledger_dir).await?;

        let summary = RunSummary::new(self.field, &ledger, started.elapsed());
        Ok(summary.render(self.config.format))
    }
}

fn default_output(field: Field) -> PathBuf {
    match field {
        Field::Brand => PathBuf::from("asin_brands.csv"),
        Field::Price => PathBuf::from("asin_prices.csv"),
        Field::Image => PathBuf::from("asin_images"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amazon::client::{FetchError, ProductPages};
    use crate::config::OutputFormat;
    use async_trait::async_trait;
    use std::io::Write;
    use tempfile::tempdir;

    struct FixturePages;

    #[async_trait]
    impl ProductPages for FixturePages {
        async fn product_page(&self, asin: &str) -> Result<String, FetchError> {
            if asin.starts_with("BLOCKED") {
                return Ok(
                    "<html><head><title>Robot Check</title></head><body></body></html>"
                        .to_string(),
                );
            }
            Ok(format!(
                r#"<html><body><a id="bylineInfo">Visit the Make{} Store</a></body></html>"#,
                asin
            ))
        }

        async fn download(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            Ok(vec![0xFF])
        }
    }

    struct FixtureFactory;

    #[async_trait]
    impl SessionFactory for FixtureFactory {
        async fn acquire(&self) -> Result<Box<dyn ProductPages>> {
            Ok(Box::new(FixturePages))
        }
    }

    fn write_input(dir: &Path, lines: &str) -> PathBuf {
        let path = dir.join("asins.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", lines).unwrap();
        path
    }

    fn make_config(dir: &Path) -> Config {
        Config {
            delay_ms: 0,
            delay_jitter_ms: 0,
            snapshot_pages: false,
            ledger_dir: dir.join("ledger"),
            format: OutputFormat::Table,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_brand_run_writes_rows_and_ledger() {
        let dir = tempdir().unwrap();
        let input = write_input(dir.path(), "GOOD000001\nBLOCKED001\n");
        let out = dir.path().join("brands.csv");

        let cmd =
            HarvestCommand::new(make_config(dir.path()), Field::Brand, Some(out.clone()));
        let summary =
            cmd.execute_with_factory(Arc::new(FixtureFactory), &input).await.unwrap();

        assert!(summary.contains("Successful:   1"));
        assert!(summary.contains("Failed:       1"));

        let csv = std::fs::read_to_string(&out).unwrap();
        assert!(csv.starts_with("asin,brand\n"));
        assert!(csv.contains("GOOD000001,MakeGOOD000001"));

        let ledger_dir = dir.path().join("ledger");
        assert!(ledger_dir.join("successful_asins.txt").exists());
        assert!(ledger_dir.join("failed_asins.txt").exists());
        assert!(!ledger_dir.join("crashed_asins.txt").exists());
    }

    #[tokio::test]
    async fn test_empty_input_runs_clean() {
        let dir = tempdir().unwrap();
        let input = write_input(dir.path(), "\n\n");
        let out = dir.path().join("brands.csv");

        let cmd = HarvestCommand::new(make_config(dir.path()), Field::Brand, Some(out));
        let summary =
            cmd.execute_with_factory(Arc::new(FixtureFactory), &input).await.unwrap();

        assert!(summary.contains("Total:        0"));
    }

    #[tokio::test]
    async fn test_missing_input_is_fatal() {
        let dir = tempdir().unwrap();
        let cmd = HarvestCommand::new(make_config(dir.path()), Field::Brand, None);

        let result = cmd
            .execute_with_factory(Arc::new(FixtureFactory), Path::new("/nonexistent/asins.txt"))
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_default_outputs() {
        assert_eq!(default_output(Field::Brand), PathBuf::from("asin_brands.csv"));
        assert_eq!(default_output(Field::Price), PathBuf::from("asin_prices.csv"));
        assert_eq!(default_output(Field::Image), PathBuf::from("asin_images"));
    }
}
