use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{UploadId, UploadStatus};

/// Domain events emitted by the upload orchestrator.
///
/// Events are published after the record list has changed and consumed by:
/// - Renderers that redraw the record list
/// - Logs and audit trails
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum UploadEvent {
    /// A file passed intake and a record was created.
    Added {
        id: UploadId,
        name: String,
        size_bytes: u64,
        /// Status of the record as inserted, always `ready`.
        status: UploadStatus,
        timestamp: DateTime<Utc>,
    },

    /// The record moved from `ready` to `uploading` and its transfer began.
    Started {
        id: UploadId,
        timestamp: DateTime<Utc>,
    },

    /// The transfer for a record reported progress.
    Progress {
        id: UploadId,
        percent: u8,
        timestamp: DateTime<Utc>,
    },

    /// The transfer finished with a 2xx response.
    Succeeded {
        id: UploadId,
        timestamp: DateTime<Utc>,
    },

    /// The transfer failed.
    Failed {
        id: UploadId,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// The record was removed from the list by the user.
    Removed {
        id: UploadId,
        last_status: UploadStatus,
        timestamp: DateTime<Utc>,
    },
}

impl UploadEvent {
    /// The record this event refers to.
    pub fn id(&self) -> UploadId {
        match self {
            UploadEvent::Added { id, .. }
            | UploadEvent::Started { id, .. }
            | UploadEvent::Progress { id, .. }
            | UploadEvent::Succeeded { id, .. }
            | UploadEvent::Failed { id, .. }
            | UploadEvent::Removed { id, .. } => *id,
        }
    }

    /// Short event name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            UploadEvent::Added { .. } => "added",
            UploadEvent::Started { .. } => "started",
            UploadEvent::Progress { .. } => "progress",
            UploadEvent::Succeeded { .. } => "succeeded",
            UploadEvent::Failed { .. } => "failed",
            UploadEvent::Removed { .. } => "removed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_and_kind() {
        let id = UploadId::new();
        let event = UploadEvent::Progress {
            id,
            percent: 42,
            timestamp: Utc::now(),
        };
        assert_eq!(event.id(), id);
        assert_eq!(event.kind(), "progress");

        let event = UploadEvent::Removed {
            id,
            last_status: UploadStatus::Uploading,
            timestamp: Utc::now(),
        };
        assert_eq!(event.kind(), "removed");
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let id = UploadId::new();
        let event = UploadEvent::Failed {
            id,
            reason: "connection refused".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "failed");
        assert_eq!(json["id"], id.to_string());
        assert_eq!(json["reason"], "connection refused");

        let back: UploadEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
