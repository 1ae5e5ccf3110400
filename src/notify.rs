//! Change notification for snapshot readers.
//!
//! Each [`Subscription`] is fed by two independent sources:
//! - push: the backend's change event for the snapshot key, parsed and
//!   delivered as soon as the write commits
//! - poll: a timer task that re-reads the store every interval, covering
//!   writes whose events never reach this process
//!
//! Both only ever read. Deliveries are snapshots, so a reader can simply
//! render whatever it receives last: an unread update is replaced by the
//! next one instead of queueing behind it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::model::Snapshot;
use crate::storage::{ChangeEvent, ListenerId, PersistenceBackend};
use crate::store::{RecordStore, SNAPSHOT_KEY, run_blocking};

/// Default poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Where an update came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateSource {
    Push,
    Poll,
}

/// One delivered snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotUpdate {
    pub source: UpdateSource,
    pub snapshot: Snapshot,
}

/// Hands out subscriptions over one store.
pub struct ChangeNotifier {
    store: Arc<RecordStore>,
    poll_interval: Duration,
}

impl ChangeNotifier {
    /// Notifier with the default poll interval.
    #[must_use]
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self::with_interval(store, DEFAULT_POLL_INTERVAL)
    }

    /// Notifier with a custom poll interval. A zero interval is raised to 1 ms.
    #[must_use]
    pub fn with_interval(store: Arc<RecordStore>, poll_interval: Duration) -> Self {
        Self {
            store,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Start receiving updates.
    ///
    /// Must be called from within a tokio runtime; the poll task is spawned
    /// on it. The first poll runs immediately, so the subscriber receives
    /// the current snapshot without waiting a full interval.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = watch::channel(None);
        let tx = Arc::new(tx);
        let active = Arc::new(AtomicBool::new(true));
        let backend = Arc::clone(self.store.backend());

        let listener = {
            let tx = Arc::clone(&tx);
            let active = Arc::clone(&active);
            backend.subscribe(Arc::new(move |event: &ChangeEvent| {
                if event.key != SNAPSHOT_KEY || !active.load(Ordering::SeqCst) {
                    return;
                }
                let Some(snapshot) = parse_event(event) else {
                    return;
                };
                tx.send_replace(Some(SnapshotUpdate {
                    source: UpdateSource::Push,
                    snapshot,
                }));
            }))
        };

        let poll_task = tokio::spawn(poll_loop(
            Arc::clone(&self.store),
            self.poll_interval,
            Arc::clone(&active),
            tx,
        ));

        debug!(interval_ms = self.poll_interval.as_millis(), "subscribed");
        Subscription {
            receiver: rx,
            active,
            backend,
            listener: Some(listener),
            poll_task: Some(poll_task),
        }
    }
}

fn parse_event(event: &ChangeEvent) -> Option<Snapshot> {
    match serde_json::from_str(&event.new_value) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!(error = %e, "skipping unparseable change event");
            None
        }
    }
}

async fn poll_loop(
    store: Arc<RecordStore>,
    interval: Duration,
    active: Arc<AtomicBool>,
    tx: Arc<watch::Sender<Option<SnapshotUpdate>>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !active.load(Ordering::SeqCst) || tx.is_closed() {
            break;
        }
        match run_blocking(&store, RecordStore::snapshot).await {
            Ok(snapshot) => {
                tx.send_replace(Some(SnapshotUpdate {
                    source: UpdateSource::Poll,
                    snapshot,
                }));
            }
            Err(e) => warn!(error = %e, "poll read failed, keeping previous snapshot"),
        }
    }
    debug!("poll task stopped");
}

/// A live subscription. Dropping it unsubscribes.
pub struct Subscription {
    receiver: watch::Receiver<Option<SnapshotUpdate>>,
    active: Arc<AtomicBool>,
    backend: Arc<dyn PersistenceBackend>,
    listener: Option<ListenerId>,
    poll_task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wait for the next update.
    ///
    /// Only the latest undelivered update is kept. Returns `None` once
    /// unsubscribed.
    pub async fn recv(&mut self) -> Option<SnapshotUpdate> {
        if !self.is_active() {
            return None;
        }
        self.receiver.changed().await.ok()?;
        if !self.is_active() {
            return None;
        }
        self.receiver.borrow_and_update().clone()
    }

    /// Take the pending update, if any, without waiting.
    pub fn try_recv(&mut self) -> Option<SnapshotUpdate> {
        if !self.is_active() || !self.receiver.has_changed().unwrap_or(false) {
            return None;
        }
        self.receiver.borrow_and_update().clone()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop both sources. No update is delivered after this returns.
    pub fn unsubscribe(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(id) = self.listener.take() {
            self.backend.unsubscribe(id);
        }
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
        self.receiver.mark_unchanged();
        debug!("unsubscribed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.listener.is_some() || self.poll_task.is_some() {
            self.unsubscribe();
        }
    }
}
