//! Sync orchestration.
//!
//! - **Orchestrator**: extractor → `RecordStore::merge` → [`SyncOutcome`]
//! - **Messages**: status lines with a fixed display lifetime
//! - **Status**: per-kind counts and last sync times

mod message;
mod orchestrator;
mod status;

pub use message::{STATUS_TTL, StatusMessage};
pub use orchestrator::{SyncOrchestrator, SyncOutcome};
pub use status::{CacheStatus, KindStatus, format_size, print_status};
