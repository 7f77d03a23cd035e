//! Checkpoint persistence and the run ledger.
//!
//! [`CheckpointStore`] reads and writes [`CheckpointState`] as one JSON blob
//! under a fixed key. [`RunLedger`] owns the live state for a run and is the
//! only thing that mutates it: pipelines hand it finished records through
//! [`RunLedger::accept`] and report page turns through
//! [`RunLedger::set_cursor`].

use tracing::{debug, info, warn};

use crate::error::StoreResult;
use crate::traits::store::{Dataset, KeyValueStore};
use crate::types::{CheckpointState, OfferRecord};

/// Key the checkpoint blob is stored under.
pub const STATE_KEY: &str = "STATE";

/// Default number of acceptances between periodic flushes.
pub const DEFAULT_FLUSH_EVERY: u64 = 25;

pub struct CheckpointStore<K> {
    store: K,
}

impl<K: KeyValueStore> CheckpointStore<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    /// Load the persisted state, or an empty one when nothing was saved yet.
    pub async fn load(&self) -> StoreResult<CheckpointState> {
        match self.store.get(STATE_KEY).await? {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                Ok(serde_json::from_slice(&bytes)?)
            }
            _ => Ok(CheckpointState::default()),
        }
    }

    /// Overwrite the persisted state with `state`.
    pub async fn save(&self, state: &CheckpointState) -> StoreResult<()> {
        let bytes = serde_json::to_vec(state)?;
        self.store.set(STATE_KEY, &bytes).await
    }
}

/// Result of offering a record to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    /// Emitted to the dataset and counted
    Saved,
    /// Dedup key already in `seen`; nothing emitted
    Duplicate,
    /// `max_items` already reached; nothing emitted
    QuotaReached,
}

/// Live checkpoint state plus the collaborators it is flushed to.
pub struct RunLedger<'a, K, D> {
    checkpoint: &'a CheckpointStore<K>,
    dataset: &'a D,
    state: CheckpointState,
    max_items: Option<u64>,
    flush_every: u64,
    emitted: u64,
    duplicates: u64,
}

impl<'a, K, D> RunLedger<'a, K, D>
where
    K: KeyValueStore,
    D: Dataset,
{
    pub fn new(
        checkpoint: &'a CheckpointStore<K>,
        dataset: &'a D,
        state: CheckpointState,
        max_items: Option<u64>,
    ) -> Self {
        Self {
            checkpoint,
            dataset,
            state,
            max_items,
            flush_every: DEFAULT_FLUSH_EVERY,
            emitted: 0,
            duplicates: 0,
        }
    }

    pub fn with_flush_every(mut self, flush_every: u64) -> Self {
        self.flush_every = flush_every.max(1);
        self
    }

    /// Dedup, emit and count one record.
    ///
    /// The key enters `seen` before the push, so a run cancelled while the
    /// push is in flight never re-emits the record on resume. A push that
    /// fails takes the key back out. Records without a dedup key are always
    /// novel.
    pub async fn accept(&mut self, record: OfferRecord) -> StoreResult<Accepted> {
        if self.quota_reached() {
            return Ok(Accepted::QuotaReached);
        }

        let key = record.dedup_key().map(str::to_string);
        if let Some(key) = key.as_deref() {
            if !self.state.seen.insert(key.to_string()) {
                debug!(key, "Skipping already seen offer");
                self.duplicates += 1;
                return Ok(Accepted::Duplicate);
            }
        }

        if let Err(e) = self.dataset.push(&record).await {
            if let Some(key) = key.as_deref() {
                self.state.seen.shift_remove(key);
            }
            return Err(e);
        }

        self.state.saved += 1;
        self.emitted += 1;

        if self.state.saved % self.flush_every == 0 {
            info!(saved = self.state.saved, "Progress");
            if let Err(e) = self.flush().await {
                warn!(error = %e, "Periodic checkpoint flush failed, continuing");
            }
        }

        Ok(Accepted::Saved)
    }

    /// Record the continuation token of the next page.
    pub fn set_cursor(&mut self, cursor: Option<String>) {
        self.state.cursor = cursor;
    }

    pub fn cursor(&self) -> Option<&str> {
        self.state.cursor.as_deref()
    }

    /// Persist the current state.
    pub async fn flush(&self) -> StoreResult<()> {
        self.checkpoint.save(&self.state).await
    }

    /// Records still allowed under `max_items`; `None` means unlimited.
    pub fn remaining(&self) -> Option<u64> {
        self.max_items
            .map(|max| max.saturating_sub(self.state.saved))
    }

    pub fn quota_reached(&self) -> bool {
        self.remaining() == Some(0)
    }

    /// Clamp `n` to the remaining quota.
    pub fn take_limit(&self, n: usize) -> usize {
        match self.remaining() {
            Some(left) => n.min(usize::try_from(left).unwrap_or(usize::MAX)),
            None => n,
        }
    }

    /// Total accepted, including records carried in from a loaded checkpoint.
    pub fn saved(&self) -> u64 {
        self.state.saved
    }

    /// Accepted during this run only.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    pub fn state(&self) -> &CheckpointState {
        &self.state
    }
}
