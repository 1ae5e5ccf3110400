//! One sync: extract a batch, merge it, report.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{info, warn};

use super::message::StatusMessage;
use crate::error::{Error, ErrorCode, Result};
use crate::extract::BoxedExtractor;
use crate::model::ObjectKind;
use crate::store::{MergeStats, RecordStore, run_blocking};

/// Result of [`SyncOrchestrator::sync_current`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<ObjectKind>,
    /// Records processed: added plus updated.
    pub count: usize,
    pub added: usize,
    pub updated: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip)]
    code: Option<ErrorCode>,
}

impl SyncOutcome {
    fn synced(kind: ObjectKind, stats: MergeStats) -> Self {
        Self {
            success: true,
            object_type: Some(kind),
            count: stats.total(),
            added: stats.added,
            updated: stats.updated,
            error: None,
            error_code: None,
            code: None,
        }
    }

    fn failed(err: &Error, kind: Option<ObjectKind>) -> Self {
        let code = err.error_code();
        Self {
            success: false,
            object_type: kind,
            count: 0,
            added: 0,
            updated: 0,
            error: Some(describe(err)),
            error_code: Some(code.as_str()),
            code: Some(code),
        }
    }

    /// The line shown to the user: `Synced 3 leads` or `Failed: <reason>`.
    #[must_use]
    pub fn status_message(&self) -> String {
        match (&self.error, self.object_type) {
            (Some(error), _) if !self.success => format!("Failed: {error}"),
            (_, Some(kind)) => format!("Synced {} {}", self.count, kind.as_str()),
            _ => format!("Synced {}", self.count),
        }
    }

    /// Process exit code for this outcome; 0 on success.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.code.map_or(0, |code| code.exit_code())
    }

    /// The failure as an error, keeping its category.
    #[must_use]
    pub fn to_error(&self) -> Option<Error> {
        if self.success {
            return None;
        }
        Some(Error::SyncFailed {
            code: self.code.unwrap_or(ErrorCode::InternalError),
            message: self.error.clone().unwrap_or_default(),
        })
    }
}

// Extraction errors carry the extractor's own reason; show it bare.
fn describe(err: &Error) -> String {
    match err {
        Error::Extraction(reason) => reason.clone(),
        other => other.to_string(),
    }
}

/// Drives extract-then-merge against one store.
pub struct SyncOrchestrator {
    store: Arc<RecordStore>,
    extractor: BoxedExtractor,
    last_status: Mutex<Option<StatusMessage>>,
}

impl SyncOrchestrator {
    #[must_use]
    pub fn new(store: Arc<RecordStore>, extractor: BoxedExtractor) -> Self {
        Self {
            store,
            extractor,
            last_status: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn extractor(&self) -> &BoxedExtractor {
        &self.extractor
    }

    /// Extract the current batch and merge it into the store.
    ///
    /// Never fails: extraction and persistence errors are reported in the
    /// outcome, and the store is left untouched by a failed sync. The
    /// extractor runs without holding any store lock; the merge runs on the
    /// blocking pool.
    pub async fn sync_current(&self) -> SyncOutcome {
        let source = self.extractor.info();

        let outcome = match self.extractor.extract().await {
            Err(e) => {
                warn!(extractor = %source.kind, error = %e, "extraction failed");
                SyncOutcome::failed(&e, None)
            }
            Ok(extraction) => {
                let kind = extraction.kind;
                let records = extraction.records;
                match run_blocking(&self.store, move |store| store.merge(kind, records)).await {
                    Ok(stats) => {
                        info!(%kind, count = stats.total(), extractor = %source.kind, "sync complete");
                        SyncOutcome::synced(kind, stats)
                    }
                    Err(e) => {
                        warn!(%kind, error = %e, "merge failed, store unchanged");
                        SyncOutcome::failed(&e, Some(kind))
                    }
                }
            }
        };

        *self
            .last_status
            .lock()
            .unwrap_or_else(PoisonError::into_inner) =
            Some(StatusMessage::new(outcome.status_message()));
        outcome
    }

    /// Extract and report what a merge would do, without writing.
    ///
    /// # Errors
    ///
    /// Returns the extraction or read error.
    pub async fn preview(&self) -> Result<(ObjectKind, MergeStats)> {
        let extraction = self.extractor.extract().await?;
        let kind = extraction.kind;
        let records = extraction.records;
        let stats =
            run_blocking(&self.store, move |store| store.preview_merge(kind, &records)).await?;
        Ok((kind, stats))
    }

    /// The last sync's status line, while it is still displayed.
    #[must_use]
    pub fn status(&self) -> Option<String> {
        self.last_status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|message| message.current().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Extractor, ExtractorInfo, ExtractorKind, ExtractorResponse};
    use crate::model::Record;
    use crate::storage::{MemoryBackend, PersistenceBackend};
    use serde_json::json;
    use tokio::sync::oneshot;

    struct CannedExtractor(ExtractorResponse);

    impl Extractor for CannedExtractor {
        fn info(&self) -> ExtractorInfo {
            ExtractorInfo {
                kind: ExtractorKind::File,
                source: "canned".into(),
            }
        }

        async fn fetch(&self) -> Result<ExtractorResponse> {
            Ok(self.0.clone())
        }
    }

    /// Holds its response until the test releases it.
    struct GatedExtractor {
        gate: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
        response: ExtractorResponse,
    }

    impl Extractor for GatedExtractor {
        fn info(&self) -> ExtractorInfo {
            ExtractorInfo {
                kind: ExtractorKind::Command,
                source: "gated".into(),
            }
        }

        async fn fetch(&self) -> Result<ExtractorResponse> {
            if let Some(gate) = self.gate.lock().await.take() {
                let _ = gate.await;
            }
            Ok(self.response.clone())
        }
    }

    fn leads_response(ids: &[&str]) -> ExtractorResponse {
        ExtractorResponse {
            success: true,
            object_type: Some("leads".into()),
            count: Some(ids.len()),
            records: ids.iter().map(|id| json!({"id": id, "name": "n"})).collect(),
            error: None,
        }
    }

    fn setup(response: ExtractorResponse) -> (Arc<MemoryBackend>, Arc<RecordStore>, SyncOrchestrator) {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(RecordStore::new(
            Arc::clone(&backend) as Arc<dyn PersistenceBackend>
        ));
        let orchestrator = SyncOrchestrator::new(
            Arc::clone(&store),
            BoxedExtractor::new(CannedExtractor(response)),
        );
        (backend, store, orchestrator)
    }

    #[tokio::test]
    async fn test_successful_sync() {
        let (_, store, orchestrator) = setup(leads_response(&["1", "2", "3"]));

        let outcome = orchestrator.sync_current().await;

        assert!(outcome.success);
        assert_eq!(outcome.object_type, Some(ObjectKind::Lead));
        assert_eq!(outcome.count, 3);
        assert_eq!(outcome.status_message(), "Synced 3 leads");
        assert_eq!(outcome.exit_code(), 0);
        assert!(outcome.to_error().is_none());
        assert_eq!(store.snapshot().unwrap().leads.len(), 3);
    }

    #[tokio::test]
    async fn test_resync_counts_updates() {
        let (_, store, orchestrator) = setup(leads_response(&["1", "2"]));
        orchestrator.sync_current().await;

        let outcome = orchestrator.sync_current().await;
        assert_eq!((outcome.added, outcome.updated, outcome.count), (0, 2, 2));
        assert_eq!(store.snapshot().unwrap().leads.len(), 2);
    }

    #[tokio::test]
    async fn test_extractor_failure() {
        let (_, store, orchestrator) = setup(ExtractorResponse {
            success: false,
            error: Some("Not on a list view".into()),
            ..ExtractorResponse::default()
        });

        let outcome = orchestrator.sync_current().await;

        assert!(!outcome.success);
        assert_eq!(outcome.status_message(), "Failed: Not on a list view");
        assert_eq!(outcome.error_code, Some("EXTRACTION_ERROR"));
        assert_eq!(outcome.exit_code(), 6);
        assert!(store.snapshot().unwrap().is_empty());

        let err = outcome.to_error().unwrap();
        assert_eq!(err.exit_code(), 6);
        assert_eq!(err.to_string(), "Sync failed: Not on a list view");
    }

    #[tokio::test]
    async fn test_unknown_object_type_fails() {
        let (_, store, orchestrator) = setup(ExtractorResponse {
            success: true,
            object_type: Some("campaigns".into()),
            ..ExtractorResponse::default()
        });

        let outcome = orchestrator.sync_current().await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("campaigns"));
        assert!(store.snapshot().unwrap().last_sync.is_empty());
    }

    #[tokio::test]
    async fn test_merge_failure_leaves_store_untouched() {
        let (backend, store, orchestrator) = setup(leads_response(&["1", "2", "3"]));
        backend.set_fail_writes(true);

        let outcome = orchestrator.sync_current().await;

        assert!(!outcome.success);
        assert_eq!(outcome.object_type, Some(ObjectKind::Lead));
        assert_eq!(outcome.error_code, Some("PERSISTENCE_ERROR"));
        assert_eq!(outcome.exit_code(), 2);

        backend.set_fail_writes(false);
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_preview_does_not_write() {
        let (_, store, orchestrator) = setup(leads_response(&["1", "2"]));

        let (kind, stats) = orchestrator.preview().await.unwrap();

        assert_eq!(kind, ObjectKind::Lead);
        assert_eq!(stats.added, 2);
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_message_is_kept() {
        let (_, _, orchestrator) = setup(leads_response(&["1"]));
        assert_eq!(orchestrator.status(), None);

        orchestrator.sync_current().await;
        assert_eq!(orchestrator.status().as_deref(), Some("Synced 1 leads"));
    }

    #[tokio::test]
    async fn test_merge_does_not_block_the_runtime() {
        let (backend, store, orchestrator) = setup(leads_response(&["1"]));
        let release = backend.gate_next_read();
        let orchestrator = Arc::new(orchestrator);

        let running = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.sync_current().await }
        });
        // The merge is stuck on its read; this thread must stay free.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!running.is_finished());

        release.send(()).unwrap();
        assert!(running.await.unwrap().success);
        assert_eq!(store.snapshot().unwrap().leads.len(), 1);
    }

    #[tokio::test]
    async fn test_extraction_runs_outside_store_lock() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(RecordStore::new(
            Arc::clone(&backend) as Arc<dyn PersistenceBackend>
        ));
        store
            .merge(ObjectKind::Task, vec![Record::new("t1")])
            .unwrap();

        let (release, gate) = oneshot::channel();
        let orchestrator = Arc::new(SyncOrchestrator::new(
            Arc::clone(&store),
            BoxedExtractor::new(GatedExtractor {
                gate: tokio::sync::Mutex::new(Some(gate)),
                response: leads_response(&["1"]),
            }),
        ));

        let running = tokio::spawn({
            let orchestrator = Arc::clone(&orchestrator);
            async move { orchestrator.sync_current().await }
        });
        tokio::task::yield_now().await;

        // The store stays writable while the extractor is pending.
        assert!(store.delete_record(ObjectKind::Task, "t1").unwrap());

        release.send(()).unwrap();
        let outcome = running.await.unwrap();
        assert!(outcome.success);

        let snapshot = store.snapshot().unwrap();
        assert!(snapshot.tasks.is_empty());
        assert_eq!(snapshot.leads.len(), 1);
    }
}
