//! Filesystem path intake, used by the command line.

use std::io;
use std::path::{Path, PathBuf};

use upkit_core::types::RawFile;

/// Files gathered from a list of paths, plus the paths that could not be read.
#[derive(Debug, Default)]
pub struct PathIntakeReport {
    pub files: Vec<RawFile>,
    pub skipped: Vec<(PathBuf, io::Error)>,
}

/// Expands paths into raw files.
///
/// Regular files are taken as-is. Directories contribute their regular
/// files, one level deep, sorted by name.
#[derive(Debug, Clone)]
pub struct PathIntake {
    guess_mime: bool,
}

impl Default for PathIntake {
    fn default() -> Self {
        Self::new()
    }
}

impl PathIntake {
    pub fn new() -> Self {
        Self { guess_mime: true }
    }

    /// Attach a MIME type guessed from the file extension.
    pub fn guess_mime(mut self, guess: bool) -> Self {
        self.guess_mime = guess;
        self
    }

    pub async fn collect(&self, paths: &[PathBuf]) -> PathIntakeReport {
        let mut report = PathIntakeReport::default();
        for path in paths {
            match tokio::fs::metadata(path).await {
                Ok(meta) if meta.is_dir() => self.collect_dir(path, &mut report).await,
                Ok(_) => self.collect_file(path, &mut report).await,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable path");
                    report.skipped.push((path.clone(), e));
                }
            }
        }
        report
    }

    async fn collect_dir(&self, dir: &Path, report: &mut PathIntakeReport) {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                report.skipped.push((dir.to_path_buf(), e));
                return;
            }
        };

        let mut children = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
                        children.push(entry.path());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    report.skipped.push((dir.to_path_buf(), e));
                    break;
                }
            }
        }
        children.sort();

        for child in children {
            self.collect_file(&child, report).await;
        }
    }

    async fn collect_file(&self, path: &Path, report: &mut PathIntakeReport) {
        match RawFile::from_path(path).await {
            Ok(file) => {
                let file = match guess_mime_type(&file.name) {
                    Some(mime) if self.guess_mime => file.with_mime_type(mime),
                    _ => file,
                };
                report.files.push(file);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping file");
                report.skipped.push((path.to_path_buf(), e));
            }
        }
    }
}

/// MIME type for common extensions.
pub fn guess_mime_type(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "zip" => "application/zip",
        "txt" | "log" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        _ => return None,
    };
    Some(mime)
}
