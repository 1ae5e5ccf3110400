//! Cache status display.
//!
//! Summarizes a snapshot for the `status` command: record counts per kind
//! and when each kind was last synced.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::model::{ObjectKind, Snapshot};

/// Status of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindStatus {
    pub kind: ObjectKind,
    pub count: usize,
    pub last_sync: Option<DateTime<Utc>>,
}

/// Status of the whole cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub database: String,
    pub bytes: usize,
    pub total: usize,
    pub kinds: Vec<KindStatus>,
}

impl CacheStatus {
    /// Build the status from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot, database: String, bytes: usize) -> Self {
        let kinds = ObjectKind::ALL
            .into_iter()
            .map(|kind| KindStatus {
                kind,
                count: snapshot.collection(kind).len(),
                last_sync: snapshot.last_sync_at(kind),
            })
            .collect();

        Self {
            database,
            bytes,
            total: snapshot.total_records(),
            kinds,
        }
    }
}

/// Print cache status to stdout in a human-readable format.
pub fn print_status(status: &CacheStatus) {
    println!("{}", "Cache Status".bold().underline());
    println!();
    println!("  Database: {}", status.database);
    println!("  Size:     {}", format_size(status.bytes));
    println!();

    if status.total == 0 {
        println!("{}", "No records cached.".dimmed());
        println!("{}", "Run 'crmsync sync' to extract records.".dimmed());
        return;
    }

    println!("{}", "Records:".blue().bold());
    for kind in &status.kinds {
        let synced = kind.last_sync.map_or_else(
            || "never synced".dimmed().to_string(),
            |at| format!("synced {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
        );
        println!("  {:<14} {:>6}  {}", format!("{}:", kind.kind.label()), kind.count, synced);
    }
    println!("  {:<14} {:>6}", "Total:".bold(), status.total);
}

/// Format a byte size as a human-readable string.
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
