//! Upload record list.
//!
//! The list is a keyed map (id -> record) owned by a single store. Every
//! mutation is a match-by-id read-modify-write under one lock, so updates
//! always see the latest state of the record they touch. Presentation order
//! (newest first) is derived from an insertion sequence number.

pub mod state_machine;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use upkit_core::types::{UploadId, UploadStatus};

use crate::error::{RecordError, TransferError};
use crate::record::state_machine::validate_transition;
use crate::types::{TransferResponse, UploadRecord};

struct Entry {
    seq: u64,
    record: UploadRecord,
}

#[derive(Default)]
struct Inner {
    records: HashMap<UploadId, Entry>,
    next_seq: u64,
}

/// In-memory record store with lifecycle management.
#[derive(Default)]
pub struct RecordStore {
    inner: Mutex<Inner>,
}

impl RecordStore {
    /// Create a new empty RecordStore.
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock only means an observer panicked elsewhere; the map
    // itself is never left half-updated.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a record at the head of the list.
    pub fn insert(&self, record: UploadRecord) -> UploadRecord {
        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.records.insert(
            record.id,
            Entry {
                seq,
                record: record.clone(),
            },
        );
        record
    }

    /// Get a record by ID.
    pub fn get(&self, id: UploadId) -> Option<UploadRecord> {
        self.lock().records.get(&id).map(|e| e.record.clone())
    }

    pub fn contains(&self, id: UploadId) -> bool {
        self.lock().records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// All records, newest first.
    pub fn snapshot(&self) -> Vec<UploadRecord> {
        let inner = self.lock();
        let mut entries: Vec<&Entry> = inner.records.values().collect();
        entries.sort_by(|a, b| b.seq.cmp(&a.seq));
        entries.into_iter().map(|e| e.record.clone()).collect()
    }

    /// Detach a record from the list. Returns `None` if it was not present.
    pub fn remove(&self, id: UploadId) -> Option<UploadRecord> {
        self.lock().records.remove(&id).map(|e| e.record)
    }

    /// Apply `f` to the record with the given id.
    fn update<T>(
        &self,
        id: UploadId,
        f: impl FnOnce(&mut UploadRecord) -> Result<T, RecordError>,
    ) -> Result<T, RecordError> {
        let mut inner = self.lock();
        let entry = inner
            .records
            .get_mut(&id)
            .ok_or(RecordError::NotFound(id))?;
        f(&mut entry.record)
    }

    /// Move a record from `ready` to `uploading`.
    pub fn start(&self, id: UploadId) -> Result<UploadRecord, RecordError> {
        self.update(id, |record| {
            validate_transition(record.status, UploadStatus::Uploading)?;
            record.status = UploadStatus::Uploading;
            record.percent = 0;
            Ok(record.clone())
        })
    }

    /// Record a progress report.
    ///
    /// Returns `Ok(None)` when the report is ignored: percent of 100 or
    /// more, a value lower than the last one, or a record that already
    /// reached a terminal state.
    pub fn progress(
        &self,
        id: UploadId,
        percent: u8,
    ) -> Result<Option<UploadRecord>, RecordError> {
        self.update(id, |record| {
            if percent >= 100 || record.status.is_terminal() {
                return Ok(None);
            }
            if record.status == UploadStatus::Ready {
                validate_transition(record.status, UploadStatus::Uploading)?;
                record.status = UploadStatus::Uploading;
            } else if percent < record.percent {
                return Ok(None);
            }
            record.percent = percent;
            Ok(Some(record.clone()))
        })
    }

    /// Mark a record as successfully uploaded.
    pub fn complete(
        &self,
        id: UploadId,
        response: TransferResponse,
    ) -> Result<UploadRecord, RecordError> {
        self.update(id, |record| {
            validate_transition(record.status, UploadStatus::Success)?;
            record.status = UploadStatus::Success;
            record.response = Some(response);
            Ok(record.clone())
        })
    }

    /// Mark a record as failed.
    pub fn fail(&self, id: UploadId, error: TransferError) -> Result<UploadRecord, RecordError> {
        self.update(id, |record| {
            validate_transition(record.status, UploadStatus::Error)?;
            record.status = UploadStatus::Error;
            record.error = Some(error);
            Ok(record.clone())
        })
    }

    /// Drop every record that reached a terminal state. Returns them.
    pub fn clear_finished(&self) -> Vec<UploadRecord> {
        let mut inner = self.lock();
        let finished: Vec<UploadId> = inner
            .records
            .iter()
            .filter(|(_, e)| e.record.status.is_terminal())
            .map(|(id, _)| *id)
            .collect();
        finished
            .into_iter()
            .filter_map(|id| inner.records.remove(&id).map(|e| e.record))
            .collect()
    }
}
