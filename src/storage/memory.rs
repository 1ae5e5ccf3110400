//! In-process persistence backend.
//!
//! Holds values in a map behind a lock. Besides serving embedders that need
//! no durability, it lets tests inject read/write failures and simulate a
//! write made by another process whose change event never arrives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Mutex, PoisonError, RwLock};

use tracing::debug;

use super::backend::{
    ChangeEvent, ChangeListener, ListenerId, Listeners, PersistenceBackend, check_quota,
};
use crate::error::{Error, Result};

/// Map-backed [`PersistenceBackend`].
#[derive(Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
    listeners: Listeners,
    quota: Option<usize>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    read_gate: Mutex<Option<Receiver<()>>>,
}

impl MemoryBackend {
    /// Create an empty backend without a quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty backend limited to `quota` bytes.
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Make every subsequent `set` fail (until reset).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `get` fail (until reset).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make the next `get` block until the returned sender fires (or is
    /// dropped).
    ///
    /// Stands in for a slow or locked database.
    pub fn gate_next_read(&self) -> Sender<()> {
        let (release, gate) = channel();
        *self.read_gate.lock().unwrap_or_else(PoisonError::into_inner) = Some(gate);
        release
    }

    /// Write a value without notifying listeners.
    ///
    /// Stands in for a write by another process whose change event is lost.
    pub fn set_without_notify(&self, key: &str, value: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    /// Number of registered change listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl PersistenceBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let gate = self
            .read_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(gate) = gate {
            let _ = gate.recv();
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Persistence("simulated read failure".to_string()));
        }
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Persistence("simulated write failure".to_string()));
        }

        let old_value = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let used_by_others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            check_quota(self.quota, used_by_others, key, value)?;
            entries.insert(key.to_string(), value.to_string())
        };

        debug!(key, bytes = value.len(), "memory backend write");
        self.listeners.notify(&ChangeEvent {
            key: key.to_string(),
            old_value,
            new_value: value.to_string(),
        });
        Ok(())
    }

    fn subscribe(&self, listener: ChangeListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}
