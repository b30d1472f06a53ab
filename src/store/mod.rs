// ABOUTME: Persistence for the virtual clock calibration
// ABOUTME: Key-value backends plus the fail-soft snapshot store built on them

mod backend;
mod snapshot;

pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use snapshot::ClockStore;
