//! Upload orchestrator.
//!
//! Owns the record list and runs one independent pipeline per submitted
//! file: pre-flight hook, record creation, transfer, and the progress and
//! terminal updates that follow.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use upkit_core::error::Result;
use upkit_core::events::UploadEvent;
use upkit_core::types::{RawFile, UploadId};

use crate::error::{RecordError, TransferError};
use crate::hook::{BeforeUpload, Preflight};
use crate::observer::UploadObserver;
use crate::record::RecordStore;
use crate::transfer::{HttpTransfer, ProgressSink, ProgressTracker, TransferAdapter, TransferRequest};
use crate::types::{TransferResponse, UploadOptions, UploadRecord};

const EVENT_CHANNEL_CAPACITY: usize = 256;

struct Shared {
    options: UploadOptions,
    store: RecordStore,
    adapter: Arc<dyn TransferAdapter>,
    before_upload: Option<Arc<dyn BeforeUpload>>,
    observers: Vec<Arc<dyn UploadObserver>>,
    events: broadcast::Sender<UploadEvent>,
}

/// Coordinates concurrent uploads and owns their records.
///
/// Cloning is cheap and every clone drives the same record list.
#[derive(Clone)]
pub struct UploadOrchestrator {
    shared: Arc<Shared>,
}

/// Builder for [`UploadOrchestrator`].
pub struct OrchestratorBuilder {
    options: UploadOptions,
    adapter: Option<Arc<dyn TransferAdapter>>,
    before_upload: Option<Arc<dyn BeforeUpload>>,
    observers: Vec<Arc<dyn UploadObserver>>,
}

impl OrchestratorBuilder {
    /// Use a custom transfer adapter instead of [`HttpTransfer`].
    pub fn adapter(mut self, adapter: Arc<dyn TransferAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Run `hook` on every file before a record is created.
    pub fn before_upload(mut self, hook: Arc<dyn BeforeUpload>) -> Self {
        self.before_upload = Some(hook);
        self
    }

    /// Register an observer. Observers are notified in registration order.
    pub fn observer(mut self, observer: Arc<dyn UploadObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Validate the options and build the orchestrator.
    pub fn build(self) -> Result<UploadOrchestrator> {
        self.options.validate()?;
        let adapter = match self.adapter {
            Some(adapter) => adapter,
            None => Arc::new(HttpTransfer::new()?),
        };
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(UploadOrchestrator {
            shared: Arc::new(Shared {
                options: self.options,
                store: RecordStore::new(),
                adapter,
                before_upload: self.before_upload,
                observers: self.observers,
                events,
            }),
        })
    }
}

/// Handle on the pipelines started by one [`UploadOrchestrator::submit`] call.
///
/// Dropping it does not cancel anything.
#[derive(Debug)]
pub struct UploadBatch {
    handles: Vec<JoinHandle<Option<UploadId>>>,
}

impl UploadBatch {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every pipeline to finish.
    ///
    /// Returns one entry per submitted file, in submission order: the record
    /// id when the file was accepted, `None` when it was discarded or
    /// rejected before a record existed.
    pub async fn join(self) -> Vec<Option<UploadId>> {
        let mut ids = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            match handle.await {
                Ok(id) => ids.push(id),
                Err(e) => {
                    tracing::warn!(error = %e, "Upload pipeline task failed");
                    ids.push(None);
                }
            }
        }
        ids
    }
}

impl UploadOrchestrator {
    pub fn builder(options: UploadOptions) -> OrchestratorBuilder {
        OrchestratorBuilder {
            options,
            adapter: None,
            before_upload: None,
            observers: Vec::new(),
        }
    }

    pub fn options(&self) -> &UploadOptions {
        &self.shared.options
    }

    /// Start one independent pipeline per file and return immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, files: impl IntoIterator<Item = RawFile>) -> UploadBatch {
        let handles = files
            .into_iter()
            .map(|file| {
                let shared = Arc::clone(&self.shared);
                tokio::spawn(shared.run_pipeline(file))
            })
            .collect();
        UploadBatch { handles }
    }

    /// Remove a record from the list.
    ///
    /// Removing an unknown or already removed id is a no-op. The transfer
    /// of a removed record keeps running, but its later events are dropped.
    pub fn remove(&self, id: UploadId) -> Option<UploadRecord> {
        let record = self.shared.store.remove(id)?;
        tracing::info!(id = %id, file = %record.name, status = %record.status, "Upload removed");
        self.shared.notify_removed(&record);
        Some(record)
    }

    /// Remove every record that reached `success` or `error`.
    pub fn clear_finished(&self) -> Vec<UploadRecord> {
        let cleared = self.shared.store.clear_finished();
        for record in &cleared {
            self.shared.notify_removed(record);
        }
        cleared
    }

    /// All records, newest first.
    pub fn snapshot(&self) -> Vec<UploadRecord> {
        self.shared.store.snapshot()
    }

    pub fn get(&self, id: UploadId) -> Option<UploadRecord> {
        self.shared.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.shared.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.store.is_empty()
    }

    /// Subscribe to record list changes.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.shared.events.subscribe()
    }

    /// Apply a progress report from a transfer.
    pub fn handle_progress(&self, id: UploadId, percent: u8) {
        self.shared.handle_progress(id, percent);
    }

    /// Apply a successful transfer outcome.
    pub fn handle_complete(&self, id: UploadId, response: TransferResponse) {
        self.shared.handle_complete(id, response);
    }

    /// Apply a failed transfer outcome.
    pub fn handle_failure(&self, id: UploadId, error: TransferError) {
        self.shared.handle_failure(id, error);
    }
}

impl Shared {
    async fn run_pipeline(self: Arc<Self>, file: RawFile) -> Option<UploadId> {
        let file = match &self.before_upload {
            None => file,
            Some(hook) => {
                let name = file.name.clone();
                match hook.check(file).await {
                    Ok(Preflight::Accept(file)) => file,
                    Ok(Preflight::Discard) => {
                        tracing::debug!(file = %name, "File discarded by pre-flight hook");
                        return None;
                    }
                    Err(e) => {
                        tracing::warn!(file = %name, error = %e, "File rejected by pre-flight hook");
                        return None;
                    }
                }
            }
        };

        let record = self.store.insert(UploadRecord::new(file));
        let id = record.id;
        tracing::info!(id = %id, file = %record.name, size_bytes = record.size_bytes, "Upload accepted");
        self.publish(UploadEvent::Added {
            id,
            name: record.name.clone(),
            size_bytes: record.size_bytes,
            status: record.status,
            timestamp: Utc::now(),
        });

        let record = match self.store.start(id) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(id = %id, error = %e, "Upload not started");
                return Some(id);
            }
        };
        self.publish(UploadEvent::Started {
            id,
            timestamp: Utc::now(),
        });

        let sink: Arc<dyn ProgressSink> = Arc::new(RecordProgress {
            shared: Arc::clone(&self),
            id,
        });
        let tracker = ProgressTracker::new(record.size_bytes, sink);
        let request = TransferRequest::from_options(record.raw, &self.options);

        match self.adapter.transfer(request, tracker).await {
            Ok(response) => self.handle_complete(id, response),
            Err(error) => self.handle_failure(id, error),
        }
        Some(id)
    }

    fn publish(&self, event: UploadEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn handle_progress(&self, id: UploadId, percent: u8) {
        match self.store.progress(id, percent) {
            Ok(Some(record)) => {
                tracing::debug!(id = %id, percent, "Upload progress");
                for observer in &self.observers {
                    if !self.store.contains(id) {
                        return;
                    }
                    observer.on_progress(percent, &record.raw);
                }
                self.publish(UploadEvent::Progress {
                    id,
                    percent,
                    timestamp: Utc::now(),
                });
            }
            Ok(None) => {}
            Err(RecordError::NotFound(_)) => {
                tracing::trace!(id = %id, percent, "Dropping progress for removed upload");
            }
            Err(e) => tracing::debug!(id = %id, error = %e, "Ignoring progress"),
        }
    }

    fn handle_complete(&self, id: UploadId, response: TransferResponse) {
        match self.store.complete(id, response.clone()) {
            Ok(record) => {
                tracing::info!(id = %id, file = %record.name, status = response.status, "Upload succeeded");
                let listed = self.notify_while_listed(id, &record.raw, |observer| {
                    observer.on_success(&response, &record.raw);
                });
                if listed {
                    self.publish(UploadEvent::Succeeded {
                        id,
                        timestamp: Utc::now(),
                    });
                }
            }
            Err(RecordError::NotFound(_)) => {
                tracing::debug!(id = %id, "Dropping completion for removed upload");
            }
            Err(e) => tracing::warn!(id = %id, error = %e, "Ignoring completion"),
        }
    }

    fn handle_failure(&self, id: UploadId, error: TransferError) {
        match self.store.fail(id, error.clone()) {
            Ok(record) => {
                tracing::warn!(id = %id, file = %record.name, error = %error, "Upload failed");
                let listed = self.notify_while_listed(id, &record.raw, |observer| {
                    observer.on_error(&error, &record.raw);
                });
                if listed {
                    self.publish(UploadEvent::Failed {
                        id,
                        reason: error.to_string(),
                        timestamp: Utc::now(),
                    });
                }
            }
            Err(RecordError::NotFound(_)) => {
                tracing::debug!(id = %id, "Dropping failure for removed upload");
            }
            Err(e) => tracing::warn!(id = %id, error = %e, "Ignoring failure"),
        }
    }

    /// Run the terminal callback and then `on_change` for each observer,
    /// stopping once the record is no longer listed.
    ///
    /// Observers run outside the store lock, so membership is checked before
    /// every callback. A removal on another thread can still overlap a
    /// callback that has already begun. Returns whether the record was still
    /// listed after the last observer.
    fn notify_while_listed(
        &self,
        id: UploadId,
        file: &RawFile,
        terminal: impl Fn(&dyn UploadObserver),
    ) -> bool {
        for observer in &self.observers {
            if !self.store.contains(id) {
                return false;
            }
            terminal(observer.as_ref());
            if !self.store.contains(id) {
                return false;
            }
            observer.on_change(file);
        }
        self.store.contains(id)
    }

    fn notify_removed(&self, record: &UploadRecord) {
        for observer in &self.observers {
            observer.on_remove(record);
        }
        self.publish(UploadEvent::Removed {
            id: record.id,
            last_status: record.status,
            timestamp: Utc::now(),
        });
    }
}

/// Routes tracker reports for one record back into the orchestrator.
struct RecordProgress {
    shared: Arc<Shared>,
    id: UploadId,
}

impl ProgressSink for RecordProgress {
    fn report(&self, percent: u8) {
        self.shared.handle_progress(self.id, percent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use upkit_core::types::UploadStatus;

    /// Adapter that reports fixed progress values and then succeeds.
    struct FixedTransfer {
        steps: Vec<u8>,
    }

    #[async_trait]
    impl TransferAdapter for FixedTransfer {
        async fn transfer(
            &self,
            _request: TransferRequest,
            progress: ProgressTracker,
        ) -> std::result::Result<TransferResponse, TransferError> {
            for step in &self.steps {
                progress.report(*step);
            }
            Ok(TransferResponse::new(200, r#"{"ok":true}"#))
        }
    }

    fn make_orchestrator(steps: Vec<u8>) -> UploadOrchestrator {
        UploadOrchestrator::builder(UploadOptions::new("http://localhost/upload"))
            .adapter(Arc::new(FixedTransfer { steps }))
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_rejects_invalid_options() {
        let result = UploadOrchestrator::builder(UploadOptions::default())
            .adapter(Arc::new(FixedTransfer { steps: vec![] }))
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_submit_single_file_succeeds() {
        let orch = make_orchestrator(vec![10, 55, 99]);
        let ids = orch
            .submit(vec![RawFile::from_bytes("a.txt", vec![0u8; 1000])])
            .join()
            .await;

        let id = ids[0].unwrap();
        let record = orch.get(id).unwrap();
        assert_eq!(record.status, UploadStatus::Success);
        assert_eq!(record.percent, 99);
        assert_eq!(record.response.unwrap().json().unwrap()["ok"], true);
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn test_empty_submit() {
        let orch = make_orchestrator(vec![]);
        let batch = orch.submit(Vec::new());
        assert!(batch.is_empty());
        assert!(batch.join().await.is_empty());
        assert!(orch.is_empty());
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_noop() {
        let orch = make_orchestrator(vec![]);
        assert!(orch.remove(UploadId::new()).is_none());
        assert_eq!(orch.len(), 0);
    }

    #[tokio::test]
    async fn test_late_handlers_for_unknown_id_are_ignored() {
        let orch = make_orchestrator(vec![]);
        let id = UploadId::new();
        orch.handle_progress(id, 50);
        orch.handle_complete(id, TransferResponse::new(200, ""));
        orch.handle_failure(id, TransferError::Timeout);
        assert!(orch.is_empty());
    }

    #[tokio::test]
    async fn test_events_are_published() {
        let orch = make_orchestrator(vec![50]);
        let mut rx = orch.subscribe();
        orch.submit(vec![RawFile::from_bytes("a.txt", vec![0u8; 10])])
            .join()
            .await;

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.kind());
        }
        assert_eq!(kinds, vec!["added", "started", "progress", "succeeded"]);
    }
}
