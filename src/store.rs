//! The record store: merge, delete, clear and snapshot reads.
//!
//! The whole cache is one JSON document persisted under [`SNAPSHOT_KEY`].
//! Every mutation follows the same protocol:
//! 1. Take the writer lock (one mutation at a time)
//! 2. Read the current persisted snapshot
//! 3. Apply the change to that owned copy
//! 4. Persist the copy with a single backend write
//! 5. Publish it as the last-known snapshot
//!
//! A failed read or write aborts before step 5, so neither the persisted
//! document nor the in-memory copy ever holds a half-applied change.
//! Readers go straight to the backend, whose single-key reads are atomic,
//! and never wait on the writer lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{ObjectKind, Record, Snapshot};
use crate::storage::PersistenceBackend;

/// The persistence key holding the snapshot document.
pub const SNAPSHOT_KEY: &str = "salesforce_data";

/// Outcome of a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Records appended to the collection.
    pub added: usize,
    /// Existing records updated in place.
    pub updated: usize,
}

impl MergeStats {
    /// Records processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.added + self.updated
    }
}

/// Owner of the persisted snapshot.
///
/// Share it behind an `Arc`; all methods take `&self`.
pub struct RecordStore {
    backend: Arc<dyn PersistenceBackend>,
    writer: Mutex<()>,
    last_known: RwLock<Snapshot>,
}

impl RecordStore {
    /// Create a store over `backend`. Nothing is read or written yet.
    #[must_use]
    pub fn new(backend: Arc<dyn PersistenceBackend>) -> Self {
        Self {
            backend,
            writer: Mutex::new(()),
            last_known: RwLock::new(Snapshot::empty()),
        }
    }

    /// The backend this store persists to.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn PersistenceBackend> {
        &self.backend
    }

    /// Read the current snapshot.
    ///
    /// Returns an owned copy; changing it has no effect on the store.
    /// A key that was never written reads as the empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the backend read fails or the stored
    /// document cannot be parsed.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let snapshot = self.read_persisted()?;
        self.remember(snapshot.clone());
        Ok(snapshot)
    }

    /// The last snapshot successfully read or written by this store.
    ///
    /// Callers whose `snapshot()` failed may fall back to this copy.
    #[must_use]
    pub fn last_known(&self) -> Snapshot {
        self.last_known
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Look up one record on a fresh snapshot.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the read fails.
    pub fn get_record(&self, kind: ObjectKind, id: &str) -> Result<Option<Record>> {
        Ok(self.snapshot()?.find(kind, id).cloned())
    }

    /// Persist the empty snapshot if nothing is stored yet.
    ///
    /// Returns true if a document was written.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the read or write fails.
    pub fn initialize(&self) -> Result<bool> {
        let _guard = self.lock_writer();
        if self.backend.get(SNAPSHOT_KEY)?.is_some() {
            return Ok(false);
        }
        let empty = Snapshot::empty();
        self.persist("initialize", &empty)?;
        self.remember(empty);
        Ok(true)
    }

    /// Fold a batch of records into the collection for `kind`.
    ///
    /// A record whose id is already present is updated in place (its
    /// position is kept); any other record is appended. After a non-empty
    /// batch, `lastSync[kind]` is set to now. An empty batch writes nothing.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the snapshot cannot be read or the
    /// updated snapshot cannot be written. The store is then unchanged.
    pub fn merge(&self, kind: ObjectKind, incoming: Vec<Record>) -> Result<MergeStats> {
        if incoming.is_empty() {
            debug!(%kind, "empty batch, nothing to merge");
            return Ok(MergeStats::default());
        }

        let batch = incoming.len();
        let stats = self.mutate("merge", |snapshot| {
            let now = chrono::Utc::now().timestamp_millis();
            Ok((apply_merge(snapshot, kind, incoming, now), true))
        })?;

        info!(%kind, batch, added = stats.added, updated = stats.updated, "merged records");
        Ok(stats)
    }

    /// Compute what [`merge`](Self::merge) would report, without writing.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the snapshot cannot be read.
    pub fn preview_merge(&self, kind: ObjectKind, incoming: &[Record]) -> Result<MergeStats> {
        let mut snapshot = self.read_persisted()?;
        Ok(apply_merge(&mut snapshot, kind, incoming.to_vec(), 0))
    }

    /// Remove the record with `id` from the collection for `kind`.
    ///
    /// Returns false (and writes nothing) if no such record exists.
    /// `lastSync` is not touched.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the read or write fails; the store is
    /// then unchanged.
    pub fn delete_record(&self, kind: ObjectKind, id: &str) -> Result<bool> {
        let found = self.mutate("delete_record", |snapshot| {
            let collection = snapshot.collection_mut(kind);
            match collection.iter().position(|r| r.id == id) {
                Some(pos) => {
                    collection.remove(pos);
                    Ok((true, true))
                }
                None => Ok((false, false)),
            }
        })?;

        if found {
            info!(%kind, id, "deleted record");
        } else {
            debug!(%kind, id, "delete of unknown record ignored");
        }
        Ok(found)
    }

    /// Reset every collection and `lastSync` with one write.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the write fails; the store is then
    /// unchanged.
    pub fn clear_all(&self) -> Result<()> {
        let _guard = self.lock_writer();
        let empty = Snapshot::empty();
        self.persist("clear_all", &empty)?;
        self.remember(empty);
        info!("cleared all records");
        Ok(())
    }

    /// Run one read-modify-write cycle under the writer lock.
    ///
    /// `f` returns its result plus whether the snapshot must be written.
    fn mutate<F, R>(&self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut Snapshot) -> Result<(R, bool)>,
    {
        let _guard = self.lock_writer();

        let mut working = self.read_persisted()?;
        let (result, changed) = f(&mut working)?;

        if changed {
            self.persist(op, &working)?;
        }
        self.remember(working);
        Ok(result)
    }

    fn persist(&self, op: &str, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        self.backend.set(SNAPSHOT_KEY, &json).inspect_err(|e| {
            warn!(op, backend = self.backend.name(), error = %e, "write failed, store left unchanged");
        })
    }

    fn read_persisted(&self) -> Result<Snapshot> {
        match self.backend.get(SNAPSHOT_KEY)? {
            Some(json) => {
                serde_json::from_str(&json).map_err(|e| Error::CorruptSnapshot(e.to_string()))
            }
            None => Ok(Snapshot::empty()),
        }
    }

    fn remember(&self, snapshot: Snapshot) {
        *self
            .last_known
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    // Every write is a single atomic backend call, so a writer that
    // panicked cannot have left partial state behind the lock.
    fn lock_writer(&self) -> std::sync::MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run a store operation on tokio's blocking pool.
///
/// Backend calls can block (SQLite waits up to its busy timeout), so async
/// code reaches the store through here rather than on a worker thread.
///
/// # Errors
///
/// Returns the operation's error, or `Error::Other` if the task panicked.
pub async fn run_blocking<T, F>(store: &Arc<RecordStore>, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&RecordStore) -> Result<T> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| Error::Other(format!("store task failed: {e}")))?
}

/// Merge `incoming` into `snapshot`'s collection for `kind`.
///
/// Duplicate ids within the batch are applied in order: the first is
/// appended, later ones update it. `lastSync[kind]` is set to `now` when
/// the batch is non-empty. Other kinds are never touched.
fn apply_merge(
    snapshot: &mut Snapshot,
    kind: ObjectKind,
    incoming: Vec<Record>,
    now: i64,
) -> MergeStats {
    if incoming.is_empty() {
        return MergeStats::default();
    }

    let collection = snapshot.collection_mut(kind);
    let mut positions: HashMap<String, usize> = collection
        .iter()
        .enumerate()
        .map(|(pos, r)| (r.id.clone(), pos))
        .collect();

    let mut stats = MergeStats::default();
    for record in incoming {
        if let Some(&pos) = positions.get(&record.id) {
            collection[pos].replace_fields(record);
            stats.updated += 1;
        } else {
            positions.insert(record.id.clone(), collection.len());
            collection.push(record);
            stats.added += 1;
        }
    }

    snapshot.last_sync.insert(kind, now);
    stats
}
