//! Artifact persistence: CSV rows, image files, page snapshots.

use crate::harvest::outcome::Harvested;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Persists one successful value. Called by the worker before it reports
/// `Success`, so a recorded success always has its artifact on disk (or in
/// the row buffer flushed at end of run).
#[async_trait]
pub trait ValueSink: Send + Sync {
    async fn persist(&self, asin: &str, value: &Harvested) -> Result<()>;

    /// Flushes any buffered output. Called once after all workers finish.
    async fn finish(&self) -> Result<()>;
}

/// Buffers `asin -> value` rows and writes a CSV at end of run.
///
/// Rows land in completion order; the mutex is the only state shared between
/// workers besides the collector channel.
pub struct RowSink {
    path: PathBuf,
    header: &'static str,
    rows: Mutex<Vec<(String, String)>>,
}

impl RowSink {
    pub fn new(path: impl Into<PathBuf>, header: &'static str) -> Self {
        Self { path: path.into(), header, rows: Mutex::new(Vec::new()) }
    }

    pub async fn row_count(&self) -> usize {
        self.rows.lock().await.len()
    }
}

#[async_trait]
impl ValueSink for RowSink {
    async fn persist(&self, asin: &str, value: &Harvested) -> Result<()> {
        let text = match value {
            Harvested::Text(text) => text.clone(),
            Harvested::Image { url, .. } => url.clone(),
        };
        self.rows.lock().await.push((asin.to_string(), text));
        Ok(())
    }

    async fn finish(&self) -> Result<()> {
        let rows = self.rows.lock().await;
        let mut lines = Vec::with_capacity(rows.len() + 1);
        lines.push(self.header.to_string());
        for (asin, value) in rows.iter() {
            lines.push(format!("{},{}", asin, csv_escape(value)));
        }

        tokio::fs::write(&self.path, lines.join("\n") + "\n")
            .await
            .with_context(|| format!("Failed to write rows: {}", self.path.display()))?;

        debug!("Wrote {} rows to {}", rows.len(), self.path.display());
        Ok(())
    }
}

/// Writes downloaded image bytes to `<asin>.jpg` immediately.
pub struct ImageSink {
    dir: PathBuf,
}

impl ImageSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates the output directory if missing.
    pub async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create output directory: {}", self.dir.display()))
    }

    pub fn image_path(&self, asin: &str) -> PathBuf {
        self.dir.join(format!("{}.jpg", asin))
    }
}

#[async_trait]
impl ValueSink for ImageSink {
    async fn persist(&self, asin: &str, value: &Harvested) -> Result<()> {
        let Harvested::Image { url, bytes } = value else {
            anyhow::bail!("Image sink received a non-image value for {}", asin);
        };

        let path = self.image_path(asin);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write image: {}", path.display()))?;
        debug!("Saved {} bytes from {} to {}", bytes.len(), url, path.display());
        Ok(())
    }

    async fn finish(&self) -> Result<()> {
        Ok(())
    }
}

/// Best-effort raw-page snapshots for diagnosing soft failures.
pub struct SnapshotWriter {
    dir: Option<PathBuf>,
}

impl SnapshotWriter {
    /// `dir = None` disables snapshots entirely.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn disabled() -> Self {
        Self { dir: None }
    }

    pub async fn prepare(&self) -> Result<()> {
        if let Some(dir) = &self.dir {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create snapshot directory: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Writes `<asin>.html`. Failures only warn: snapshots are diagnostics,
    /// not outcomes.
    pub async fn save(&self, asin: &str, html: &str) {
        let Some(dir) = &self.dir else { return };
        let path = dir.join(format!("{}.html", asin));
        if let Err(e) = tokio::fs::write(&path, html).await {
            warn!("Failed to write snapshot {}: {}", path.display(), e);
        }
    }

    pub fn snapshot_path(&self, asin: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(format!("{}.html", asin)))
    }
}

/// Quotes a CSV field when it contains a delimiter, quote, or newline.
pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Writes one outcome class of the run ledger as a line-delimited file.
pub async fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    content.push('\n');
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
