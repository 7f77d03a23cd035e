//! Storage implementations for the checkpoint blob and the output dataset.
//!
//! Available backends:
//! - `MemoryStore` - In-memory storage (tests, dry runs)
//! - `FileStore` - Local directory in the Apify local-storage layout
//! - `ApifyStore` - Apify platform key-value store and dataset

pub mod apify;
pub mod file;
pub mod memory;

pub use apify::ApifyStore;
pub use file::FileStore;
pub use memory::MemoryStore;
