use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

/// Chunk size used when streaming file content.
pub const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// A stream of file content chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + Sync>>;

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque identifier of an upload record.
///
/// Assigned at intake time and stable for the record's lifetime. It is the
/// only key used to correlate removal requests with orchestrator state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadId(pub Uuid);

impl UploadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Upload record lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Ready,
    Uploading,
    Success,
    Error,
}

impl UploadStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Success | UploadStatus::Error)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStatus::Ready => write!(f, "ready"),
            UploadStatus::Uploading => write!(f, "uploading"),
            UploadStatus::Success => write!(f, "success"),
            UploadStatus::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for UploadStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ready" => Ok(UploadStatus::Ready),
            "uploading" => Ok(UploadStatus::Uploading),
            "success" => Ok(UploadStatus::Success),
            "error" => Ok(UploadStatus::Error),
            _ => Err(format!("Unknown upload status: {}", s)),
        }
    }
}

// =============================================================================
// Raw files
// =============================================================================

/// Where the bytes of a [`RawFile`] live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileSource {
    /// Content already held in memory.
    Memory(Bytes),
    /// Content read lazily from disk when the transfer starts.
    Path(PathBuf),
}

/// Handle to a file selected for upload.
///
/// Cheap to clone: in-memory content is reference counted and on-disk
/// content is only opened when streamed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: Option<String>,
    pub source: FileSource,
}

impl RawFile {
    /// Build an in-memory file.
    pub fn from_bytes(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size_bytes: content.len() as u64,
            mime_type: None,
            source: FileSource::Memory(content),
        }
    }

    /// Build a file backed by a path on disk, reading its size from metadata.
    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            size_bytes: metadata.len(),
            mime_type: None,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Attach a MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Rename the file, keeping its content.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Lower-cased extension of the file name, without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    /// Open the content as a stream of chunks.
    pub async fn open(&self) -> io::Result<ByteStream> {
        match &self.source {
            FileSource::Memory(content) => {
                let content = content.clone();
                let chunks: Vec<io::Result<Bytes>> = (0..content.len())
                    .step_by(STREAM_CHUNK_SIZE)
                    .map(|start| {
                        let end = (start + STREAM_CHUNK_SIZE).min(content.len());
                        Ok(content.slice(start..end))
                    })
                    .collect();
                Ok(Box::pin(stream::iter(chunks)))
            }
            FileSource::Path(path) => {
                let file = tokio::fs::File::open(path).await?;
                Ok(Box::pin(ReaderStream::with_capacity(
                    file,
                    STREAM_CHUNK_SIZE,
                )))
            }
        }
    }
}
