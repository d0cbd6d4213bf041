//! The per-identifier fetch worker.

use crate::amazon::client::{FetchError, SessionFactory};
use crate::amazon::extract::{Candidate, Extractor};
use crate::harvest::outcome::{HardReason, Harvested, Outcome, SoftReason};
use crate::sink::{SnapshotWriter, ValueSink};
use scraper::Html;
use tracing::{debug, info, warn};

/// What one pass over the parsed page yielded.
///
/// Parsed documents are not `Send`, so classification happens in one scope
/// and the document is gone before any further await.
enum PageRead {
    Blocked,
    Missing,
    Placeholder,
    Found(Candidate),
}

fn read_page(extractor: &Extractor, html: &str) -> PageRead {
    let document = Html::parse_document(html);

    if extractor.is_blocked(&document) {
        return PageRead::Blocked;
    }

    match extractor.extract(&document) {
        None => PageRead::Missing,
        Some(candidate) if extractor.is_placeholder(&candidate) => PageRead::Placeholder,
        Some(candidate) => PageRead::Found(candidate),
    }
}

/// Fetches one identifier and classifies the result.
///
/// Exactly one outcome per invocation, no retries. The session is acquired
/// at the top, owned exclusively by this invocation, and dropped on every
/// exit path. Failures never propagate past this boundary: anything the
/// classification steps don't anticipate comes back as a hard failure so
/// the driving loop can tell a broken tool from an unscrapeable target.
pub async fn harvest_one(
    factory: &dyn SessionFactory,
    extractor: &Extractor,
    sink: &dyn ValueSink,
    snapshots: &SnapshotWriter,
    asin: &str,
) -> Outcome {
    info!("Harvesting {}: {}", extractor.field(), asin);

    let session = match factory.acquire().await {
        Ok(session) => session,
        Err(e) => {
            warn!("{}: session acquisition failed: {}", asin, e);
            return Outcome::Hard(HardReason::Session(e.to_string()));
        }
    };

    let html = match session.product_page(asin).await {
        Ok(html) => html,
        Err(FetchError::Timeout(wait)) => {
            warn!("{}: page load exceeded {:?}", asin, wait);
            return Outcome::Soft(SoftReason::Timeout);
        }
        Err(FetchError::Status(status)) => {
            warn!("{}: page fetch returned status {}", asin, status);
            return Outcome::Soft(SoftReason::Http(status));
        }
        Err(FetchError::Transport(e)) => {
            warn!("{}: page fetch failed: {}", asin, e);
            return Outcome::Soft(SoftReason::Transport);
        }
    };

    let candidate = match read_page(extractor, &html) {
        PageRead::Blocked => {
            warn!("{}: blocked by robot check", asin);
            snapshots.save(asin, &html).await;
            return Outcome::Soft(SoftReason::Blocked);
        }
        PageRead::Missing => {
            warn!("{}: no selector strategy matched", asin);
            snapshots.save(asin, &html).await;
            return Outcome::Soft(SoftReason::NotFound);
        }
        PageRead::Placeholder => {
            warn!("{}: placeholder value", asin);
            snapshots.save(asin, &html).await;
            return Outcome::Soft(SoftReason::Placeholder);
        }
        PageRead::Found(candidate) => candidate,
    };

    let harvested = match candidate {
        Candidate::Text(text) => Harvested::Text(text),
        Candidate::ImageUrl(url) => match session.download(&url).await {
            Ok(bytes) => Harvested::Image { url, bytes },
            Err(e) => {
                warn!("{}: image download failed: {}", asin, e);
                snapshots.save(asin, &html).await;
                return Outcome::Soft(SoftReason::Download);
            }
        },
    };

    if let Err(e) = sink.persist(asin, &harvested).await {
        warn!("{}: persist failed: {:#}", asin, e);
        return Outcome::Hard(HardReason::Persist(e.to_string()));
    }

    debug!("{}: success", asin);
    Outcome::Success(harvested)
}
