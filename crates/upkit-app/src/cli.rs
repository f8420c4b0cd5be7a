//! CLI argument definitions for the upkit binary.
//!
//! Priority resolution: CLI args > `UPKIT_*` env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use upkit_core::config::UploadConfig;
use upkit_upload::UploadOptions;

/// upkit: upload files to an HTTP endpoint as multipart form posts.
#[derive(Parser, Debug)]
#[command(name = "upkit", version, about)]
pub struct CliArgs {
    /// Files or directories to upload. Directories contribute their files,
    /// one level deep.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Destination endpoint URL.
    #[arg(short = 'a', long = "action")]
    pub action: Option<String>,

    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Form field name of the file part.
    #[arg(short = 'f', long = "field")]
    pub field: Option<String>,

    /// Extra form field, as key=value. Repeatable.
    #[arg(short = 'd', long = "data", value_parser = parse_key_val)]
    pub data: Vec<(String, String)>,

    /// Extra request header, as name=value. Repeatable.
    #[arg(short = 'H', long = "header", value_parser = parse_key_val)]
    pub headers: Vec<(String, String)>,

    /// Send stored cookies with each request.
    #[arg(long = "with-credentials")]
    pub with_credentials: bool,

    /// Skip files larger than this many bytes.
    #[arg(long = "max-size")]
    pub max_size: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > UPKIT_CONFIG env var > ~/.upkit/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = env_var("UPKIT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Log level set explicitly by flag or UPKIT_LOG_LEVEL.
    ///
    /// Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone().or_else(|| env_var("UPKIT_LOG_LEVEL"))
    }

    /// Resolve the size limit.
    ///
    /// Priority: --max-size flag > UPKIT_MAX_SIZE env var > config file value.
    pub fn resolve_max_size(&self, config_max: Option<u64>) -> Option<u64> {
        self.resolve_max_size_with(config_max, env_var)
    }

    fn resolve_max_size_with(
        &self,
        config_max: Option<u64>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<u64> {
        if let Some(max) = self.max_size {
            return Some(max);
        }
        if let Some(val) = env("UPKIT_MAX_SIZE") {
            match val.parse::<u64>() {
                Ok(max) => return Some(max),
                Err(_) => tracing::warn!(value = %val, "Ignoring invalid UPKIT_MAX_SIZE"),
            }
        }
        config_max
    }

    /// Build upload options from the config file section and overrides.
    ///
    /// `--data` and `--header` entries are merged over the configured maps.
    pub fn resolve_options(&self, config: &UploadConfig) -> UploadOptions {
        self.resolve_options_with(config, env_var)
    }

    fn resolve_options_with(
        &self,
        config: &UploadConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> UploadOptions {
        let mut options = UploadOptions::from_config(config);

        if let Some(action) = self.action.clone().or_else(|| env("UPKIT_ACTION")) {
            options.action = action;
        }
        if let Some(field) = self.field.clone().or_else(|| env("UPKIT_FIELD")) {
            options.field_name = field;
        }
        if self.with_credentials {
            options.with_credentials = true;
        } else if let Some(val) = env("UPKIT_WITH_CREDENTIALS") {
            options.with_credentials = truthy(&val);
        }
        if let Some(val) = env("UPKIT_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) => options.timeout = Duration::from_secs(secs),
                Err(_) => tracing::warn!(value = %val, "Ignoring invalid UPKIT_TIMEOUT_SECS"),
            }
        }
        for (key, value) in &self.data {
            options.data.insert(key.clone(), value.clone());
        }
        for (name, value) in &self.headers {
            options.headers.insert(name.clone(), value.clone());
        }
        options
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".upkit").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".upkit").join("config.toml");
    }
    PathBuf::from("config.toml")
}
