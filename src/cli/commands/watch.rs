//! Print a summary line whenever the cache changes.
//!
//! Changes written by this process arrive as pushes; changes written by
//! other processes (a `crmsync sync` in another terminal) are picked up by
//! polling.

use crate::cli::commands::Workspace;
use crate::error::{Error, Result};
use crate::model::{KindCounts, Snapshot};
use crate::notify::{ChangeNotifier, UpdateSource};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WatchLine {
    at: DateTime<Utc>,
    source: UpdateSource,
    total: usize,
    counts: KindCounts,
}

/// Execute the watch command.
///
/// Runs until interrupted, or until `max_updates` lines were printed.
///
/// # Errors
///
/// Returns an error if the cache cannot be opened.
pub fn execute(
    interval_ms: Option<u64>,
    max_updates: Option<usize>,
    db_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let workspace = Workspace::open(db_path)?;
    let interval = interval_ms.map_or_else(|| workspace.settings.poll_interval(), Duration::from_millis);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;
    rt.block_on(watch(Arc::clone(&workspace.store), interval, max_updates, json))
}

async fn watch(
    store: Arc<crate::store::RecordStore>,
    interval: Duration,
    max_updates: Option<usize>,
    json: bool,
) -> Result<()> {
    let notifier = ChangeNotifier::with_interval(store, interval);
    let mut subscription = notifier.subscribe();
    if !json && !crate::is_silent() {
        eprintln!(
            "Watching for changes every {} ms (Ctrl+C to stop)",
            notifier.poll_interval().as_millis()
        );
    }

    let mut last_fingerprint: Option<String> = None;
    let mut printed = 0usize;

    loop {
        let update = tokio::select! {
            update = subscription.recv() => update,
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
        };
        let Some(update) = update else {
            break;
        };

        let fingerprint = match update.snapshot.fingerprint() {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                warn!(error = %e, "cannot fingerprint snapshot");
                continue;
            }
        };
        if last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            continue;
        }
        last_fingerprint = Some(fingerprint);

        print_line(&update.snapshot, update.source, json)?;
        printed += 1;
        if max_updates.is_some_and(|max| printed >= max) {
            break;
        }
    }

    subscription.unsubscribe();
    Ok(())
}

fn print_line(snapshot: &Snapshot, source: UpdateSource, json: bool) -> Result<()> {
    let counts = snapshot.counts();
    if json {
        let line = WatchLine {
            at: Utc::now(),
            source,
            total: counts.total(),
            counts,
        };
        println!("{}", serde_json::to_string(&line)?);
    } else if crate::is_silent() {
        println!("{}", counts.total());
    } else {
        println!(
            "[{}] {}",
            chrono::Local::now().format("%H:%M:%S"),
            summarize(&counts)
        );
    }
    Ok(())
}

fn summarize(counts: &KindCounts) -> String {
    format!(
        "{} records: {} leads, {} contacts, {} accounts, {} opportunities, {} tasks",
        counts.total(),
        counts.leads,
        counts.contacts,
        counts.accounts,
        counts.opportunities,
        counts.tasks
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObjectKind, Record};
    use crate::storage::{MemoryBackend, PersistenceBackend};
    use crate::store::RecordStore;

    #[test]
    fn test_summarize() {
        let counts = KindCounts {
            leads: 2,
            tasks: 1,
            ..KindCounts::default()
        };
        assert_eq!(
            summarize(&counts),
            "3 records: 2 leads, 0 contacts, 0 accounts, 0 opportunities, 1 tasks"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_stops_after_max_updates() {
        let backend: Arc<dyn PersistenceBackend> = Arc::new(MemoryBackend::new());
        let store = Arc::new(RecordStore::new(backend));

        let writer = Arc::clone(&store);
        let task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            writer
                .merge(ObjectKind::Lead, vec![Record::new("1")])
                .unwrap();
        });

        // Initial poll, then the merge.
        watch(store, Duration::from_millis(10), Some(2), true)
            .await
            .unwrap();
        task.await.unwrap();
    }
}
