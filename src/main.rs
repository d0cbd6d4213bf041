//! asin-harvest - Batch ASIN field harvester for Amazon product pages
//!
//! A Rust implementation with TLS fingerprint emulation for reliable scraping.

use anyhow::Result;
use asin_harvest::amazon::regions::Region;
use asin_harvest::commands::HarvestCommand;
use asin_harvest::config::{Config, OutputFormat};
use asin_harvest::harvest::outcome::Field;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "asin-harvest",
    version,
    about = "Batch ASIN field harvester for Amazon product pages",
    long_about = "Fetches product detail pages for a list of ASINs and extracts one field \
                  per run (brand, primary image, or price), filing every identifier into a \
                  success/failed/crashed/unprocessed ledger."
)]
struct Cli {
    /// Amazon region to fetch from
    #[arg(short, long, default_value = "us", global = true)]
    region: Region,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "HARVEST_PROXY")]
    proxy: Option<String>,

    /// Delay between page requests in milliseconds
    #[arg(long, default_value = "2000", global = true, env = "HARVEST_DELAY")]
    delay: u64,

    /// Number of concurrent workers
    #[arg(short, long, default_value = "4", global = true, env = "HARVEST_WORKERS")]
    workers: usize,

    /// Process at most this many identifiers
    #[arg(long, global = true)]
    max: Option<usize>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Summary output format
    #[arg(short, long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest brand names into a CSV
    #[command(alias = "b")]
    Brand {
        /// Newline-delimited ASIN list
        input: PathBuf,

        /// Output CSV path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Harvest primary product images into a directory
    #[command(alias = "i")]
    Image {
        /// Newline-delimited ASIN list
        input: PathBuf,

        /// Output directory for <asin>.jpg files
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Harvest price strings into a CSV
    #[command(alias = "p")]
    Price {
        /// Newline-delimited ASIN list
        input: PathBuf,

        /// Output CSV path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List supported regions
    Regions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    config.region = cli.region;
    config.format = cli.format;
    config.delay_ms = cli.delay;
    config.workers = cli.workers;

    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if cli.max.is_some() {
        config.max_items = cli.max;
    }

    match cli.command {
        Commands::Brand { input, out } => {
            let cmd = HarvestCommand::new(config, Field::Brand, out);
            let output = cmd.execute(&input).await?;
            println!("{}", output);
        }

        Commands::Image { input, out } => {
            let cmd = HarvestCommand::new(config, Field::Image, out);
            let output = cmd.execute(&input).await?;
            println!("{}", output);
        }

        Commands::Price { input, out } => {
            let cmd = HarvestCommand::new(config, Field::Price, out);
            let output = cmd.execute(&input).await?;
            println!("{}", output);
        }

        Commands::Regions => {
            println!("Supported Amazon regions:\n");
            println!("{:<6} {:<20}", "Code", "Domain");
            println!("{:-<6} {:-<20}", "", "");

            for region in Region::all() {
                println!("{:<6} {:<20}", region.to_string(), region.domain());
            }
        }
    }

    Ok(())
}
