//! Provider and repository implementations.
//!
//! In-memory backends serve embedded usage and tests; the file backends
//! persist monitoring state and the notification ledger as JSON lines.

mod file;
mod memory;

pub use file::{FileLedgerRepository, FileMonitoringRepository};
pub use memory::{
    InMemoryLedgerRepository, InMemoryMonitoringRepository, InMemoryRainfallProvider,
    InMemoryTrackProvider, StaticBoundaryProvider,
};
