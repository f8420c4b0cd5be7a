use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// Top-level configuration for upkit.
///
/// Loaded from `~/.upkit/config.toml` by default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpkitConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

impl UpkitConfig {
    /// Read `path` as TOML. Missing sections and fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: UpkitConfig = toml::from_str(&content)?;
        info!(path = %path.display(), "Read upkit config");
        Ok(config)
    }
}

/// `[general]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default tracing filter when neither `--log-level` nor `RUST_LOG` is set.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Upload endpoint and form settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Destination endpoint receiving the multipart POST.
    pub action: String,
    /// Form field name of the file part.
    pub field_name: String,
    /// Extra static form fields appended after the file part.
    pub data: BTreeMap<String, String>,
    /// Extra static request headers.
    pub headers: BTreeMap<String, String>,
    /// Send stored cookies with the request.
    pub with_credentials: bool,
    /// Accepted file types, e.g. `"image/*,.pdf"`. Advisory only.
    pub accept: String,
    /// Allow selecting more than one file at a time.
    pub multiple: bool,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Largest accepted file in bytes. `None` accepts any size.
    pub max_file_size: Option<u64>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            action: String::new(),
            field_name: "file".to_string(),
            data: BTreeMap::new(),
            headers: BTreeMap::new(),
            with_credentials: false,
            accept: String::new(),
            multiple: true,
            timeout_secs: 300,
            max_file_size: None,
        }
    }
}
