//! HTTP multipart transfer adapter.
//!
//! Posts the file as a streamed `multipart/form-data` part followed by the
//! extra form fields. Progress is measured as the body stream is consumed.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::cookie::Jar;
use reqwest::multipart::{Form, Part};
use upkit_core::error::{Result, UpkitError};
use upkit_core::types::ByteStream;

use crate::error::TransferError;
use crate::transfer::{ProgressTracker, TransferAdapter, TransferRequest};
use crate::types::TransferResponse;

/// Transfer adapter backed by `reqwest`.
///
/// Holds two clients sharing one cookie jar: requests that set
/// `with_credentials` go through the client that sends and stores cookies,
/// all others through a client without cookie support.
#[derive(Clone)]
pub struct HttpTransfer {
    client: reqwest::Client,
    credentialed: reqwest::Client,
    jar: Arc<Jar>,
}

impl std::fmt::Debug for HttpTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransfer").finish_non_exhaustive()
    }
}

impl HttpTransfer {
    pub fn new() -> Result<Self> {
        Self::with_jar(Arc::new(Jar::default()))
    }

    /// Build an adapter sharing an existing cookie jar.
    pub fn with_jar(jar: Arc<Jar>) -> Result<Self> {
        let user_agent = concat!("upkit/", env!("CARGO_PKG_VERSION"));
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| UpkitError::Upload(format!("Failed to build HTTP client: {}", e)))?;
        let credentialed = reqwest::Client::builder()
            .user_agent(user_agent)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|e| UpkitError::Upload(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            credentialed,
            jar,
        })
    }

    /// Cookie jar used for credentialed requests.
    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    fn build_form(
        request: &TransferRequest,
        content: ByteStream,
        tracker: ProgressTracker,
    ) -> std::result::Result<Form, TransferError> {
        let file = &request.file;
        let counted = content.map(move |chunk| {
            if let Ok(bytes) = &chunk {
                tracker.advance(bytes.len() as u64);
            }
            chunk
        });

        let mut part =
            Part::stream_with_length(reqwest::Body::wrap_stream(counted), file.size_bytes)
                .file_name(file.name.clone());
        if let Some(mime) = &file.mime_type {
            part = part.mime_str(mime).map_err(|e| {
                TransferError::InvalidRequest(format!(
                    "invalid MIME type for {}: {}",
                    file.name, e
                ))
            })?;
        }

        let mut form = Form::new().part(request.field_name.clone(), part);
        for (key, value) in &request.data {
            form = form.text(key.clone(), value.clone());
        }
        Ok(form)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransferError {
    if err.is_timeout() {
        TransferError::Timeout
    } else if err.is_builder() {
        TransferError::InvalidRequest(err.to_string())
    } else {
        TransferError::Network(err.to_string())
    }
}

#[async_trait]
impl TransferAdapter for HttpTransfer {
    async fn transfer(
        &self,
        request: TransferRequest,
        progress: ProgressTracker,
    ) -> std::result::Result<TransferResponse, TransferError> {
        let client = if request.with_credentials {
            &self.credentialed
        } else {
            &self.client
        };

        let content = request.file.open().await?;
        progress.start();
        let form = Self::build_form(&request, content, progress)?;

        let mut builder = client
            .post(&request.endpoint)
            .timeout(request.timeout)
            .multipart(form);
        for (name, value) in &request.headers {
            // The multipart encoder owns the content type and its boundary.
            if name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        tracing::debug!(
            file = %request.file.name,
            size_bytes = request.file.size_bytes,
            endpoint = %request.endpoint,
            "Starting multipart upload"
        );

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            return Err(TransferError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(TransferResponse::new(status.as_u16(), body))
    }
}
