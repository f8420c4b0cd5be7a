//! Upload record state machine with validated transitions.
//!
//! Enforces the allowed state transitions for the record lifecycle:
//! Ready -> Uploading -> Success/Error

use upkit_core::types::UploadStatus;

use crate::error::RecordError;

/// Validate that a status transition is allowed.
///
/// Valid transitions:
/// - Ready -> Uploading
/// - Uploading -> Success
/// - Uploading -> Error
pub fn validate_transition(from: UploadStatus, to: UploadStatus) -> Result<(), RecordError> {
    let valid = matches!(
        (from, to),
        (UploadStatus::Ready, UploadStatus::Uploading)
            | (UploadStatus::Uploading, UploadStatus::Success)
            | (UploadStatus::Uploading, UploadStatus::Error)
    );

    if valid {
        Ok(())
    } else {
        Err(RecordError::InvalidTransition(from, to))
    }
}
