//! Data models for crmsync.
//!
//! - `ObjectKind` - the five CRM record categories and their field sets
//! - `Record` - one cached record
//! - `Snapshot` - the complete persisted state

pub mod kind;
pub mod record;
pub mod snapshot;

pub use kind::ObjectKind;
pub use record::Record;
pub use snapshot::{KindCounts, Snapshot};
