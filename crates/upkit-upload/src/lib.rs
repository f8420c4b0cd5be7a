//! Upload engine for upkit.
//!
//! Accepts files from intake surfaces, runs them through an optional
//! pre-flight hook, and transfers each one concurrently through a pluggable
//! adapter while keeping an ordered list of upload records.

pub mod error;
pub mod hook;
pub mod intake;
pub mod observer;
pub mod orchestrator;
pub mod record;
pub mod transfer;
pub mod types;

pub use error::{HookError, RecordError, TransferError};
pub use hook::{hook_fn, BeforeUpload, FnHook, MaxSizeHook, Preflight};
pub use intake::{
    AcceptFilter, DragEvent, DragIntake, FilePicker, IntakeTarget, PathIntake, PathIntakeReport,
};
pub use observer::{CallbackObserver, UploadObserver};
pub use orchestrator::{OrchestratorBuilder, UploadBatch, UploadOrchestrator};
pub use record::RecordStore;
pub use transfer::{
    progress_percent, HttpTransfer, ProgressSink, ProgressTracker, TransferAdapter,
    TransferRequest, MAX_PROGRESS_PERCENT,
};
pub use types::{TransferResponse, UploadOptions, UploadRecord};
