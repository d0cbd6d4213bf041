//! Identifier list loading.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};

/// Loads a newline-delimited ASIN list.
///
/// Lines are trimmed and uppercased; blank lines are skipped. Input order is
/// preserved and duplicates are kept. Tokens that don't look like ASINs are
/// logged and passed through anyway, so the run ledger still accounts for
/// every line of the input file.
pub fn load_identifiers(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read identifier list: {}", path.display()))?;

    let asins: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_uppercase())
        .collect();

    for asin in &asins {
        if !looks_like_asin(asin) {
            warn!("Input token '{}' does not look like an ASIN", asin);
        }
    }

    debug!("Loaded {} identifiers from {}", asins.len(), path.display());
    Ok(asins)
}

/// ASINs are 10 ASCII alphanumeric characters.
pub fn looks_like_asin(token: &str) -> bool {
    token.len() == 10 && token.chars().all(|c| c.is_ascii_alphanumeric())
}
