//! The complete persisted state of the cache.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use super::{ObjectKind, Record};
use crate::error::Result;

/// Five collections plus the per-kind last successful sync time.
///
/// Serializes to the persisted document shape:
/// `{"leads":[],"contacts":[],"accounts":[],"opportunities":[],"tasks":[],"lastSync":{}}`.
/// Missing members read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub leads: Vec<Record>,
    #[serde(default)]
    pub contacts: Vec<Record>,
    #[serde(default)]
    pub accounts: Vec<Record>,
    #[serde(default)]
    pub opportunities: Vec<Record>,
    #[serde(default)]
    pub tasks: Vec<Record>,
    /// Epoch milliseconds of the last completed merge, per kind.
    #[serde(default)]
    pub last_sync: BTreeMap<ObjectKind, i64>,
}

/// Record counts per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub leads: usize,
    pub contacts: usize,
    pub accounts: usize,
    pub opportunities: usize,
    pub tasks: usize,
}

impl KindCounts {
    /// Total across all kinds.
    #[must_use]
    pub fn total(&self) -> usize {
        self.leads + self.contacts + self.accounts + self.opportunities + self.tasks
    }
}

impl Snapshot {
    /// The empty initial state.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The collection for `kind`.
    #[must_use]
    pub fn collection(&self, kind: ObjectKind) -> &[Record] {
        match kind {
            ObjectKind::Lead => &self.leads,
            ObjectKind::Contact => &self.contacts,
            ObjectKind::Account => &self.accounts,
            ObjectKind::Opportunity => &self.opportunities,
            ObjectKind::Task => &self.tasks,
        }
    }

    /// Mutable access to the collection for `kind`.
    pub fn collection_mut(&mut self, kind: ObjectKind) -> &mut Vec<Record> {
        match kind {
            ObjectKind::Lead => &mut self.leads,
            ObjectKind::Contact => &mut self.contacts,
            ObjectKind::Account => &mut self.accounts,
            ObjectKind::Opportunity => &mut self.opportunities,
            ObjectKind::Task => &mut self.tasks,
        }
    }

    /// Find a record by kind and id.
    #[must_use]
    pub fn find(&self, kind: ObjectKind, id: &str) -> Option<&Record> {
        self.collection(kind).iter().find(|r| r.id == id)
    }

    /// Last successful sync of `kind`.
    #[must_use]
    pub fn last_sync_at(&self, kind: ObjectKind) -> Option<DateTime<Utc>> {
        self.last_sync
            .get(&kind)
            .and_then(|ms| Utc.timestamp_millis_opt(*ms).single())
    }

    /// Record counts per kind.
    #[must_use]
    pub fn counts(&self) -> KindCounts {
        KindCounts {
            leads: self.leads.len(),
            contacts: self.contacts.len(),
            accounts: self.accounts.len(),
            opportunities: self.opportunities.len(),
            tasks: self.tasks.len(),
        }
    }

    /// Total number of records across all kinds.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.counts().total()
    }

    /// True when every collection and `lastSync` are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_records() == 0 && self.last_sync.is_empty()
    }

    /// SHA256 of the canonical JSON form.
    ///
    /// Two snapshots with equal content have equal fingerprints, so readers
    /// can skip re-rendering when a notification carries nothing new.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn fingerprint(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&json);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        let mut snapshot = Snapshot::empty();
        snapshot.leads.push(Record::new("1").with_field("name", "Alice"));
        snapshot.tasks.push(Record::new("t1").with_field("subject", "Call back"));
        snapshot.last_sync.insert(ObjectKind::Lead, 1_700_000_000_000);
        snapshot
    }

    #[test]
    fn test_document_shape() {
        let json = serde_json::to_value(Snapshot::empty()).unwrap();
        for key in ["leads", "contacts", "accounts", "opportunities", "tasks", "lastSync"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_missing_members_read_as_empty() {
        let parsed: Snapshot = serde_json::from_str(r#"{"leads":[{"id":"1"}]}"#).unwrap();
        assert_eq!(parsed.leads.len(), 1);
        assert!(parsed.contacts.is_empty());
        assert!(parsed.last_sync.is_empty());
    }

    #[test]
    fn test_last_sync_keyed_by_collection_name() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["lastSync"]["leads"], 1_700_000_000_000_i64);
        let at = sample().last_sync_at(ObjectKind::Lead).unwrap();
        assert_eq!(at.timestamp_millis(), 1_700_000_000_000);
        assert!(sample().last_sync_at(ObjectKind::Task).is_none());
    }

    #[test]
    fn test_counts() {
        let counts = sample().counts();
        assert_eq!(counts.leads, 1);
        assert_eq!(counts.tasks, 1);
        assert_eq!(counts.total(), 2);
        assert!(!sample().is_empty());
        assert!(Snapshot::empty().is_empty());
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = sample();
        let mut b = sample();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());

        b.collection_mut(ObjectKind::Lead)[0].set("name", Some("Alicia".into()));
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }
}
