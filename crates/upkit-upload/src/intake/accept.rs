//! File-type hints for pickers.

use std::fmt;

use upkit_core::types::RawFile;

#[derive(Debug, Clone, PartialEq, Eq)]
enum AcceptToken {
    /// `.pdf`
    Extension(String),
    /// `image/*`
    MimePrefix(String),
    /// `application/json`
    Mime(String),
}

/// Parsed `accept` string, e.g. `"image/*,.pdf,application/json"`.
///
/// Advisory only: the picker uses it to pre-filter its dialog, but nothing
/// stops other files from being submitted. An empty filter matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptFilter {
    raw: String,
    tokens: Vec<AcceptToken>,
}

impl AcceptFilter {
    pub fn parse(accept: &str) -> Self {
        let tokens = accept
            .split(',')
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .filter_map(|t| {
                if let Some(ext) = t.strip_prefix('.') {
                    (!ext.is_empty()).then(|| AcceptToken::Extension(ext.to_string()))
                } else if let Some(prefix) = t.strip_suffix("/*") {
                    Some(AcceptToken::MimePrefix(format!("{}/", prefix)))
                } else if t.contains('/') {
                    Some(AcceptToken::Mime(t))
                } else {
                    tracing::debug!(token = %t, "Ignoring unrecognized accept token");
                    None
                }
            })
            .collect();
        Self {
            raw: accept.trim().to_string(),
            tokens,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, file: &RawFile) -> bool {
        if self.tokens.is_empty() {
            return true;
        }
        let extension = file.extension();
        let mime = file.mime_type.as_deref().map(str::to_ascii_lowercase);
        self.tokens.iter().any(|token| match token {
            AcceptToken::Extension(ext) => extension.as_deref() == Some(ext.as_str()),
            AcceptToken::MimePrefix(prefix) => {
                mime.as_deref().is_some_and(|m| m.starts_with(prefix.as_str()))
            }
            AcceptToken::Mime(expected) => mime.as_deref() == Some(expected.as_str()),
        })
    }
}

impl fmt::Display for AcceptFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
