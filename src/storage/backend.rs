//! The persistence backend contract.
//!
//! A backend is a key-value store with get/set semantics and change
//! notification. Listeners are invoked after a write has been committed,
//! outside any backend lock, with the key's old and new values.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{Error, Result};

/// Default storage capacity: 10 MiB, the size of a browser extension's
/// local storage area.
pub const DEFAULT_QUOTA_BYTES: usize = 10 * 1024 * 1024;

/// A committed write to one key.
///
/// Keys are only ever written, never removed, so a change always carries
/// the new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: String,
}

/// Handle returned by [`PersistenceBackend::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Callback invoked for every committed write.
pub type ChangeListener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Key-value persistence with change notification.
pub trait PersistenceBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Read a key. A key that was never written reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the read fails.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a key atomically, then notify listeners.
    ///
    /// On error nothing is written and no listener is called.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the write fails or exceeds the quota.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Register a change listener.
    fn subscribe(&self, listener: ChangeListener) -> ListenerId;

    /// Remove a listener. Returns false if it was not registered.
    fn unsubscribe(&self, id: ListenerId) -> bool;
}

/// Listener registry shared by the backend implementations.
#[derive(Default)]
pub struct Listeners {
    next_id: AtomicU64,
    entries: Mutex<Vec<(ListenerId, ChangeListener)>>,
}

impl Listeners {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn add(&self, listener: ChangeListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    /// Remove a listener by id.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver an event to every listener registered at call time.
    ///
    /// The registry lock is released before any callback runs, so a
    /// listener may subscribe, unsubscribe or read the backend.
    pub fn notify(&self, event: &ChangeEvent) {
        let current: Vec<ChangeListener> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in current {
            listener(event);
        }
    }
}

/// Reject a write that would push the store over its quota.
///
/// Usage is counted as key bytes plus value bytes, over all keys.
///
/// # Errors
///
/// Returns `Error::QuotaExceeded` if `used_by_other_keys` plus this entry
/// exceeds `quota`.
pub fn check_quota(
    quota: Option<usize>,
    used_by_other_keys: usize,
    key: &str,
    value: &str,
) -> Result<()> {
    let Some(limit) = quota else {
        return Ok(());
    };
    let needed = used_by_other_keys + key.len() + value.len();
    if needed > limit {
        return Err(Error::QuotaExceeded { needed, limit });
    }
    Ok(())
}
