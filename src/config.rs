//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::amazon::regions::Region;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Run configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Amazon region the detail URLs are built against
    #[serde(default)]
    pub region: Region,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Base delay between page requests in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Fixed worker pool size
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Bounded wait for a product page load, in seconds
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Bounded wait for a secondary download (image bytes), in seconds
    #[serde(default = "default_page_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Process at most this many identifiers from the input list
    #[serde(default)]
    pub max_items: Option<usize>,

    /// Summary output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Where the outcome-class ledger files are written
    #[serde(default = "default_ledger_dir")]
    pub ledger_dir: PathBuf,

    /// Keep raw-page snapshots of soft failures
    #[serde(default = "default_snapshot_pages")]
    pub snapshot_pages: bool,

    /// Snapshot directory
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
}

fn default_delay_ms() -> u64 {
    2000
}

fn default_delay_jitter_ms() -> u64 {
    3000
}

fn default_workers() -> usize {
    4
}

fn default_page_timeout_secs() -> u64 {
    10
}

fn default_ledger_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_snapshot_pages() -> bool {
    true
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("debug_pages")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: Region::Us,
            proxy: None,
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            workers: default_workers(),
            page_timeout_secs: default_page_timeout_secs(),
            download_timeout_secs: default_page_timeout_secs(),
            max_items: None,
            format: OutputFormat::Table,
            ledger_dir: default_ledger_dir(),
            snapshot_pages: default_snapshot_pages(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("asin-harvest").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(region) = std::env::var("HARVEST_REGION") {
            if let Ok(r) = region.parse() {
                self.region = r;
            }
        }

        if let Ok(proxy) = std::env::var("HARVEST_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("HARVEST_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        if let Ok(workers) = std::env::var("HARVEST_WORKERS") {
            if let Ok(w) = workers.parse() {
                self.workers = w;
            }
        }

        self
    }
}

/// Summary output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use: table, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
