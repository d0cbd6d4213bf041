//! Fixed-size worker pool and the single outcome collector.

use crate::amazon::client::SessionFactory;
use crate::amazon::extract::Extractor;
use crate::harvest::ledger::RunLedger;
use crate::harvest::outcome::{HardReason, Outcome};
use crate::harvest::worker::harvest_one;
use crate::sink::{SnapshotWriter, ValueSink};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Drives a run: dispatches each identifier to exactly one worker
/// invocation, bounded by a fixed pool size, and collects outcomes in
/// completion order.
pub struct Harvester {
    factory: Arc<dyn SessionFactory>,
    extractor: Arc<Extractor>,
    sink: Arc<dyn ValueSink>,
    snapshots: Arc<SnapshotWriter>,
    workers: usize,
}

impl Harvester {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        extractor: Extractor,
        sink: Arc<dyn ValueSink>,
        snapshots: SnapshotWriter,
        workers: usize,
    ) -> Self {
        Self {
            factory,
            extractor: Arc::new(extractor),
            sink,
            snapshots: Arc::new(snapshots),
            workers: workers.max(1),
        }
    }

    /// Runs the pool to completion over `input` and returns the finalized
    /// ledger. Blocks until every dispatched invocation has reported; there
    /// is no partial-results mode and no cancellation of in-flight work.
    ///
    /// With `max_items`, only the first N identifiers are dispatched; the
    /// rest are never scheduled and end up in the unprocessed class.
    pub async fn run(&self, input: &[String], max_items: Option<usize>) -> RunLedger {
        let dispatched: &[String] = match max_items {
            Some(cap) if cap < input.len() => {
                info!("Capping run to the first {} of {} identifiers", cap, input.len());
                &input[..cap]
            }
            _ => input,
        };

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks: JoinSet<(String, Outcome)> = JoinSet::new();
        let mut task_ids: HashMap<tokio::task::Id, String> = HashMap::new();

        for asin in dispatched {
            let asin = asin.clone();
            let semaphore = semaphore.clone();
            let factory = self.factory.clone();
            let extractor = self.extractor.clone();
            let sink = self.sink.clone();
            let snapshots = self.snapshots.clone();
            let asin_for_map = asin.clone();

            let handle = tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            asin.clone(),
                            Outcome::Hard(HardReason::Task("worker pool closed".to_string())),
                        );
                    }
                };
                let outcome = harvest_one(
                    factory.as_ref(),
                    extractor.as_ref(),
                    sink.as_ref(),
                    snapshots.as_ref(),
                    &asin,
                )
                .await;
                (asin, outcome)
            });
            task_ids.insert(handle.id(), asin_for_map);
        }

        // Single collector: outcomes arrive in completion order, and this
        // loop is the only writer of the ledger.
        let mut ledger = RunLedger::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, (asin, outcome))) => {
                    task_ids.remove(&id);
                    match &outcome {
                        Outcome::Success(_) => info!("{}: harvested", asin),
                        Outcome::Soft(reason) => info!("{}: failed ({})", asin, reason),
                        Outcome::Hard(reason) => error!("{}: crashed ({})", asin, reason),
                    }
                    ledger.record(&asin, &outcome);
                }
                Err(join_error) => {
                    // A worker died without reporting; its identifier is
                    // recovered from the dispatch map.
                    let asin = task_ids
                        .remove(&join_error.id())
                        .unwrap_or_else(|| "<unknown>".to_string());
                    error!("{}: worker task lost ({})", asin, join_error);
                    ledger.record(&asin, &Outcome::Hard(HardReason::Task(join_error.to_string())));
                }
            }
        }

        ledger.finalize(input);
        ledger
    }
}
