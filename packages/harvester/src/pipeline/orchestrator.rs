//! Run orchestration: checkpoint load, primary pipeline, fallback, final flush.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::checkpoint::{CheckpointStore, RunLedger};
use crate::client::SourceClient;
use crate::error::{Result, StoreResult};
use crate::traits::store::{Dataset, KeyValueStore};
use crate::traits::transport::Transport;
use crate::types::HarvestConfig;

use super::fallback::{FallbackOutcome, FallbackPipeline};
use super::primary::{PrimaryOutcome, PrimaryPipeline, StopReason};

/// What a run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Total accepted records, including those carried in from the checkpoint
    pub saved: u64,
    /// Records emitted during this run
    pub emitted: u64,
    pub duplicates: u64,
    pub pages: u32,
    #[serde(serialize_with = "serialize_stop")]
    pub stop: Option<StopReason>,
    pub fallback_ran: bool,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

fn serialize_stop<S: serde::Serializer>(
    stop: &Option<StopReason>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match stop {
        Some(stop) => serializer.collect_str(stop),
        None => serializer.serialize_none(),
    }
}

/// The HTML fallback runs only after a total primary failure: no page was
/// ever fetched and nothing has been accepted, counting records carried in
/// from a loaded checkpoint.
pub fn should_fall_back(primary: &PrimaryOutcome, saved: u64) -> bool {
    !primary.touched && saved == 0
}

pub struct Harvester<T: Transport, K, D> {
    client: SourceClient<T>,
    checkpoint: CheckpointStore<K>,
    dataset: D,
    config: HarvestConfig,
}

impl<T, K, D> Harvester<T, K, D>
where
    T: Transport,
    K: KeyValueStore,
    D: Dataset,
{
    pub fn new(client: SourceClient<T>, store: K, dataset: D, config: HarvestConfig) -> Self {
        Self {
            client,
            checkpoint: CheckpointStore::new(store),
            dataset,
            config,
        }
    }

    /// Run to completion or until `cancel` fires.
    ///
    /// The checkpoint is flushed before returning on every path. A failed
    /// startup load or dataset write aborts the run with an error.
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunSummary> {
        let started_at = Utc::now();

        let state = self.checkpoint.load().await?;
        info!(
            saved = state.saved,
            seen = state.seen.len(),
            cursor = ?state.cursor,
            "Loaded checkpoint"
        );
        info!(
            max_items = ?self.config.max_items,
            max_pages = self.config.max_pages,
            collect_details = self.config.collect_details,
            "Starting harvest"
        );

        let mut ledger = RunLedger::new(&self.checkpoint, &self.dataset, state, self.config.max_items)
            .with_flush_every(self.config.flush_every);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.harvest(&mut ledger) => Some(result),
        };

        let (primary, fallback_ran, cancelled) = match result {
            Some(Ok((primary, fallback))) => (Some(primary), fallback.is_some(), false),
            Some(Err(e)) => {
                error!(error = %e, "Harvest failed, flushing checkpoint");
                if let Err(flush_err) = ledger.flush().await {
                    warn!(error = %flush_err, "Best-effort checkpoint flush failed");
                }
                return Err(e.into());
            }
            None => {
                warn!(saved = ledger.saved(), "Run cancelled, flushing checkpoint");
                (None, false, true)
            }
        };

        ledger.flush().await?;

        let summary = RunSummary {
            saved: ledger.saved(),
            emitted: ledger.emitted(),
            duplicates: ledger.duplicates(),
            pages: primary.map(|p| p.pages).unwrap_or(0),
            stop: primary.map(|p| p.stop),
            fallback_ran,
            cancelled,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            saved = summary.saved,
            emitted = summary.emitted,
            elapsed_ms = summary.elapsed().num_milliseconds(),
            "Finished"
        );
        Ok(summary)
    }

    async fn harvest(
        &self,
        ledger: &mut RunLedger<'_, K, D>,
    ) -> StoreResult<(PrimaryOutcome, Option<FallbackOutcome>)> {
        let primary = PrimaryPipeline::new(&self.client, &self.config)
            .run(ledger)
            .await?;
        info!(
            pages = primary.pages,
            stop = %primary.stop,
            saved = ledger.saved(),
            "Primary pipeline finished"
        );

        if !should_fall_back(&primary, ledger.saved()) {
            if !primary.touched {
                info!(
                    saved = ledger.saved(),
                    "Listing API unreachable but records already saved, skipping fallback"
                );
            }
            return Ok((primary, None));
        }

        let fallback = FallbackPipeline::new(&self.client, &self.config)
            .run(ledger)
            .await?;
        Ok((primary, Some(fallback)))
    }
}
