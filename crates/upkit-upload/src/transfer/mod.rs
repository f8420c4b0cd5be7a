//! Transfer adapters.
//!
//! A transfer adapter moves one file to its destination. It reports progress
//! through a [`ProgressTracker`] and finishes with exactly one outcome: the
//! `Result` it returns.

pub mod http;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use upkit_core::types::RawFile;

use crate::error::TransferError;
use crate::types::{TransferResponse, UploadOptions};

pub use http::HttpTransfer;

/// Highest percent a progress stream may report. 100 is reserved for the
/// success outcome.
pub const MAX_PROGRESS_PERCENT: u8 = 99;

/// Everything an adapter needs to transfer one file.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub file: RawFile,
    pub endpoint: String,
    pub field_name: String,
    pub data: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub with_credentials: bool,
    pub timeout: Duration,
}

impl TransferRequest {
    pub fn from_options(file: RawFile, options: &UploadOptions) -> Self {
        Self {
            file,
            endpoint: options.action.clone(),
            field_name: options.field_name.clone(),
            data: options.data.clone(),
            headers: options.headers.clone(),
            with_credentials: options.with_credentials,
            timeout: options.timeout,
        }
    }
}

/// Compute `floor(transferred * 100 / total)`, capped at
/// [`MAX_PROGRESS_PERCENT`]. An unknown or zero total reports 0.
pub fn progress_percent(transferred: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = (transferred as u128 * 100) / total as u128;
    percent.min(MAX_PROGRESS_PERCENT as u128) as u8
}

/// Destination of progress reports.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8);
}

struct TrackerState {
    transferred: u64,
    last: Option<u8>,
}

/// Turns byte counts into a well-formed progress stream.
///
/// Reported values are clamped to `0..=99`, never decrease, and are not
/// repeated.
#[derive(Clone)]
pub struct ProgressTracker {
    total: u64,
    state: Arc<Mutex<TrackerState>>,
    sink: Arc<dyn ProgressSink>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("total", &self.total)
            .field("last", &self.last())
            .finish()
    }
}

impl ProgressTracker {
    pub fn new(total: u64, sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            total,
            state: Arc::new(Mutex::new(TrackerState {
                transferred: 0,
                last: None,
            })),
            sink,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Last percent handed to the sink.
    pub fn last(&self) -> Option<u8> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).last
    }

    /// Report the initial 0%.
    pub fn start(&self) {
        self.report(0);
    }

    /// Count `bytes` more as transferred and report the resulting percent.
    pub fn advance(&self, bytes: u64) {
        let percent = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.transferred = state.transferred.saturating_add(bytes);
            progress_percent(state.transferred, self.total)
        };
        self.report(percent);
    }

    /// Report a percent computed elsewhere.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(MAX_PROGRESS_PERCENT);
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if matches!(state.last, Some(last) if percent <= last) {
                return;
            }
            state.last = Some(percent);
        }
        self.sink.report(percent);
    }
}

/// Performs the transfer of a single file.
#[async_trait]
pub trait TransferAdapter: Send + Sync {
    async fn transfer(
        &self,
        request: TransferRequest,
        progress: ProgressTracker,
    ) -> Result<TransferResponse, TransferError>;
}
