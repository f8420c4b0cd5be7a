//! Pre-flight hooks.
//!
//! A hook runs once per submitted file before any record exists. It can let
//! the file through unchanged, replace it with a transformed file, discard
//! it, or reject it with an error. Discarding and rejecting only affect the
//! file being checked.

use async_trait::async_trait;
use upkit_core::types::RawFile;

use crate::error::HookError;

/// Outcome of a pre-flight check that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preflight {
    /// Upload this file. It may differ from the file that was checked.
    Accept(RawFile),
    /// Silently drop the file.
    Discard,
}

/// Validation or transformation step run before a transfer begins.
#[async_trait]
pub trait BeforeUpload: Send + Sync {
    async fn check(&self, file: RawFile) -> Result<Preflight, HookError>;
}

/// Hook backed by a synchronous closure.
pub struct FnHook<F> {
    f: F,
}

/// Wrap a synchronous closure as a [`BeforeUpload`] hook.
pub fn hook_fn<F>(f: F) -> FnHook<F>
where
    F: Fn(RawFile) -> Result<Preflight, HookError> + Send + Sync + 'static,
{
    FnHook { f }
}

#[async_trait]
impl<F> BeforeUpload for FnHook<F>
where
    F: Fn(RawFile) -> Result<Preflight, HookError> + Send + Sync + 'static,
{
    async fn check(&self, file: RawFile) -> Result<Preflight, HookError> {
        (self.f)(file)
    }
}

/// Discards files larger than a byte limit.
#[derive(Debug, Clone, Copy)]
pub struct MaxSizeHook {
    pub max_bytes: u64,
}

impl MaxSizeHook {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

#[async_trait]
impl BeforeUpload for MaxSizeHook {
    async fn check(&self, file: RawFile) -> Result<Preflight, HookError> {
        if file.size_bytes > self.max_bytes {
            tracing::info!(
                file = %file.name,
                size_bytes = file.size_bytes,
                max_bytes = self.max_bytes,
                "File exceeds size limit, discarding"
            );
            return Ok(Preflight::Discard);
        }
        Ok(Preflight::Accept(file))
    }
}
