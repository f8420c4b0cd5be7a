//! Lifecycle observers.
//!
//! Observers receive notifications after the record list has been updated.
//! Every method has a no-op default so implementors only override what they
//! need. Notifications never fire for records that were already removed.

use std::sync::Arc;

use upkit_core::types::RawFile;

use crate::error::TransferError;
use crate::types::{TransferResponse, UploadRecord};

/// Receives upload lifecycle notifications.
pub trait UploadObserver: Send + Sync {
    /// Progress below 100 was reported for `file`.
    fn on_progress(&self, _percent: u8, _file: &RawFile) {}

    /// The transfer of `file` succeeded.
    fn on_success(&self, _response: &TransferResponse, _file: &RawFile) {}

    /// The transfer of `file` failed.
    fn on_error(&self, _error: &TransferError, _file: &RawFile) {}

    /// `file` reached a terminal state, successful or not.
    fn on_change(&self, _file: &RawFile) {}

    /// `record` was removed from the list.
    fn on_remove(&self, _record: &UploadRecord) {}
}

type ProgressFn = Arc<dyn Fn(u8, &RawFile) + Send + Sync>;
type SuccessFn = Arc<dyn Fn(&TransferResponse, &RawFile) + Send + Sync>;
type ErrorFn = Arc<dyn Fn(&TransferError, &RawFile) + Send + Sync>;
type ChangeFn = Arc<dyn Fn(&RawFile) + Send + Sync>;
type RemoveFn = Arc<dyn Fn(&UploadRecord) + Send + Sync>;

/// Observer assembled from closures.
#[derive(Clone, Default)]
pub struct CallbackObserver {
    on_progress: Option<ProgressFn>,
    on_success: Option<SuccessFn>,
    on_error: Option<ErrorFn>,
    on_change: Option<ChangeFn>,
    on_remove: Option<RemoveFn>,
}

impl std::fmt::Debug for CallbackObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackObserver")
            .field("on_progress", &self.on_progress.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_change", &self.on_change.is_some())
            .field("on_remove", &self.on_remove.is_some())
            .finish()
    }
}

impl CallbackObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(u8, &RawFile) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TransferResponse, &RawFile) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TransferError, &RawFile) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(&RawFile) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(callback));
        self
    }

    pub fn on_remove<F>(mut self, callback: F) -> Self
    where
        F: Fn(&UploadRecord) + Send + Sync + 'static,
    {
        self.on_remove = Some(Arc::new(callback));
        self
    }
}

impl UploadObserver for CallbackObserver {
    fn on_progress(&self, percent: u8, file: &RawFile) {
        if let Some(cb) = &self.on_progress {
            cb(percent, file);
        }
    }

    fn on_success(&self, response: &TransferResponse, file: &RawFile) {
        if let Some(cb) = &self.on_success {
            cb(response, file);
        }
    }

    fn on_error(&self, error: &TransferError, file: &RawFile) {
        if let Some(cb) = &self.on_error {
            cb(error, file);
        }
    }

    fn on_change(&self, file: &RawFile) {
        if let Some(cb) = &self.on_change {
            cb(file);
        }
    }

    fn on_remove(&self, record: &UploadRecord) {
        if let Some(cb) = &self.on_remove {
            cb(record);
        }
    }
}
