//! Core types for the upload pipeline.
//!
//! Defines upload records, transfer responses, and the runtime options of
//! an orchestrator.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use upkit_core::config::UploadConfig;
use upkit_core::error::{Result, UpkitError};
use upkit_core::types::{RawFile, UploadId, UploadStatus};

use crate::error::TransferError;

// =============================================================================
// Records
// =============================================================================

/// Body of a successful (2xx) transfer, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferResponse {
    pub status: u16,
    pub body: String,
}

impl TransferResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Parse the body as JSON, if it is JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Bookkeeping for one file accepted for upload.
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub id: UploadId,
    pub name: String,
    pub size_bytes: u64,
    pub status: UploadStatus,
    /// Last reported progress, 0..=99. Only meaningful while uploading.
    pub percent: u8,
    pub raw: RawFile,
    pub response: Option<TransferResponse>,
    pub error: Option<TransferError>,
    pub created_at: DateTime<Utc>,
}

impl UploadRecord {
    /// Create a record in `ready` state for an accepted file.
    pub fn new(raw: RawFile) -> Self {
        Self {
            id: UploadId::new(),
            name: raw.name.clone(),
            size_bytes: raw.size_bytes,
            status: UploadStatus::Ready,
            percent: 0,
            raw,
            response: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Percent to show in a progress bar: 100 once the upload succeeded.
    pub fn display_percent(&self) -> u8 {
        match self.status {
            UploadStatus::Success => 100,
            _ => self.percent,
        }
    }
}

// =============================================================================
// Options
// =============================================================================

/// Runtime options of an upload orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOptions {
    /// Destination endpoint. Required.
    pub action: String,
    /// Form field name of the file part.
    pub field_name: String,
    /// Extra form fields appended after the file part.
    pub data: BTreeMap<String, String>,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// Include stored cookies with each request.
    pub with_credentials: bool,
    /// Accepted file types. Advisory; never enforced by the orchestrator.
    pub accept: String,
    /// Allow multi-file selection in intake surfaces.
    pub multiple: bool,
    pub timeout: Duration,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}

impl UploadOptions {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            action: config.action.clone(),
            field_name: config.field_name.clone(),
            data: config.data.clone(),
            headers: config.headers.clone(),
            with_credentials: config.with_credentials,
            accept: config.accept.clone(),
            multiple: config.multiple,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }

    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = accept.into();
        self
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.action.is_empty() {
            return Err(UpkitError::invalid_option(
                "action",
                "destination endpoint must not be empty",
            ));
        }
        if !self.action.starts_with("http://") && !self.action.starts_with("https://") {
            return Err(UpkitError::invalid_option(
                "action",
                format!(
                    "only http:// and https:// endpoints are supported, got: {}",
                    self.action
                ),
            ));
        }
        if self.field_name.trim().is_empty() {
            return Err(UpkitError::invalid_option(
                "field_name",
                "file field name must not be empty",
            ));
        }
        if self.timeout.is_zero() {
            return Err(UpkitError::invalid_option(
                "timeout",
                "timeout must be greater than 0",
            ));
        }
        Ok(())
    }
}
