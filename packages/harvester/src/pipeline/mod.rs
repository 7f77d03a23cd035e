//! Harvest pipelines.
//!
//! - `primary` - cursor pagination over the listing API plus detail enrichment
//! - `fallback` - HTML crawl used after a total primary failure
//! - `discover` - link and JSON-LD extraction for the fallback
//! - `pool` - fixed-width worker pool with ordered results
//! - `pacing` - randomized pauses between requests
//! - `orchestrator` - ties it together around the checkpoint

pub mod discover;
pub mod fallback;
pub mod orchestrator;
pub mod pacing;
pub mod pool;
pub mod primary;

pub use fallback::{FallbackOutcome, FallbackPipeline};
pub use orchestrator::{should_fall_back, Harvester, RunSummary};
pub use pool::map_ordered;
pub use primary::{PrimaryOutcome, PrimaryPipeline, StopReason};
