use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::de::{nullable, stringish};

/// Persisted run state: what has been emitted and where pagination stopped.
///
/// `seen` is written as a plain JSON array; reloading only relies on set
/// membership, not on order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointState {
    /// Records accepted into the dataset so far (across resumed runs)
    #[serde(default, deserialize_with = "nullable")]
    pub saved: u64,

    /// Dedup keys already accepted
    #[serde(default, deserialize_with = "nullable")]
    pub seen: IndexSet<String>,

    /// Continuation token of the next page; `None` starts from the beginning
    #[serde(default, deserialize_with = "stringish")]
    pub cursor: Option<String>,
}

impl CheckpointState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_seen(&self, key: &str) -> bool {
        self.seen.contains(key)
    }
}
