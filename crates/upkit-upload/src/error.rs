//! Error types for the upload pipeline.

use upkit_core::error::UpkitError;
use upkit_core::types::{UploadId, UploadStatus};

/// Opaque failure payload of a single transfer.
///
/// Stored on the failed record and handed to error observers. Callers are
/// not expected to branch on the variant; it only exists for display and
/// logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Transfer timed out")]
    Timeout,
    #[error("Failed to read file content: {0}")]
    Io(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<std::io::Error> for TransferError {
    fn from(err: std::io::Error) -> Self {
        TransferError::Io(err.to_string())
    }
}

/// Rejection raised by a pre-flight hook.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("File rejected: {0}")]
    Rejected(String),
    #[error("Pre-flight check failed: {0}")]
    Failed(#[from] UpkitError),
}

/// Errors from record list bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Upload record not found: {0}")]
    NotFound(UploadId),
    #[error("Invalid state transition: {0} -> {1}")]
    InvalidTransition(UploadStatus, UploadStatus),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_display() {
        let err = TransferError::Network("connection reset".to_string());
        assert_eq!(err.to_string(), "Network error: connection reset");

        let err = TransferError::Status {
            status: 413,
            body: "too large".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Server responded with status 413: too large"
        );

        assert_eq!(TransferError::Timeout.to_string(), "Transfer timed out");
    }

    #[test]
    fn test_transfer_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TransferError = io_err.into();
        assert!(matches!(err, TransferError::Io(ref m) if m.contains("gone")));
    }

    #[test]
    fn test_hook_error_from_upkit_error() {
        let err: HookError = UpkitError::Upload("checksum mismatch".to_string()).into();
        assert!(matches!(err, HookError::Failed(_)));
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_record_error_display() {
        let id = UploadId::new();
        let err = RecordError::NotFound(id);
        assert_eq!(err.to_string(), format!("Upload record not found: {}", id));

        let err = RecordError::InvalidTransition(UploadStatus::Success, UploadStatus::Uploading);
        assert_eq!(
            err.to_string(),
            "Invalid state transition: success -> uploading"
        );
    }
}
