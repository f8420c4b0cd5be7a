//! Plain-text rendering of the upload list.

use std::fmt::Write;

use upkit_core::events::UploadEvent;
use upkit_core::types::UploadStatus;
use upkit_upload::UploadRecord;

const BAR_WIDTH: usize = 20;

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn progress_bar(percent: u8) -> String {
    let filled = (percent as usize * BAR_WIDTH) / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}

/// Render records as a table, in list order.
pub fn render_table(records: &[UploadRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<10} {:<27} {:>10}  NAME", "STATUS", "PROGRESS", "SIZE");
    for record in records {
        let _ = write!(
            out,
            "{:<10} {:<27} {:>10}  {}",
            record.status.to_string(),
            progress_bar(record.display_percent()),
            format_size(record.size_bytes),
            record.name
        );
        if let Some(error) = &record.error {
            let _ = write!(out, "  ({})", error);
        }
        out.push('\n');
    }
    out
}

/// One status line for an event, or `None` for events not worth printing.
pub fn event_line(event: &UploadEvent, record: Option<&UploadRecord>) -> Option<String> {
    let name = record.map(|r| r.name.as_str()).unwrap_or("?");
    let line = match event {
        UploadEvent::Added {
            name, size_bytes, ..
        } => format!("+ {} ({})", name, format_size(*size_bytes)),
        UploadEvent::Progress { percent, .. } => {
            format!("  {} {}", progress_bar(*percent), name)
        }
        UploadEvent::Succeeded { .. } => format!("✓ {}", name),
        UploadEvent::Failed { reason, .. } => format!("✗ {}: {}", name, reason),
        _ => return None,
    };
    Some(line)
}

/// Final tally of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
    pub pending: usize,
    pub skipped: usize,
}

impl Summary {
    pub fn of(records: &[UploadRecord], skipped: usize) -> Self {
        let mut summary = Summary {
            skipped,
            ..Summary::default()
        };
        for record in records {
            match record.status {
                UploadStatus::Success => summary.succeeded += 1,
                UploadStatus::Error => summary.failed += 1,
                UploadStatus::Ready | UploadStatus::Uploading => summary.pending += 1,
            }
        }
        summary
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} uploaded, {} failed, {} skipped",
            self.succeeded, self.failed, self.skipped
        )?;
        if self.pending > 0 {
            write!(f, ", {} unfinished", self.pending)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use upkit_core::types::RawFile;
    use upkit_upload::TransferError;

    fn record(name: &str, size: usize, status: UploadStatus, percent: u8) -> UploadRecord {
        let mut record = UploadRecord::new(RawFile::from_bytes(name, vec![0u8; size]));
        record.status = status;
        record.percent = percent;
        record
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0), format!("[{}]   0%", "-".repeat(20)));
        assert_eq!(progress_bar(100), format!("[{}] 100%", "#".repeat(20)));
        assert!(progress_bar(50).starts_with("[##########-"));
    }

    #[test]
    fn test_render_table_keeps_list_order() {
        let mut failed = record("b.txt", 10, UploadStatus::Error, 40);
        failed.error = Some(TransferError::Timeout);
        let records = vec![failed, record("a.txt", 2048, UploadStatus::Success, 99)];

        let table = render_table(&records);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("STATUS"));
        assert!(lines[1].starts_with("error"));
        assert!(lines[1].contains("b.txt"));
        assert!(lines[1].contains("40%"));
        assert!(lines[1].ends_with("(Transfer timed out)"));
        assert!(lines[2].starts_with("success"));
        assert!(lines[2].contains("100%"));
        assert!(lines[2].contains("2.0 KB"));
    }

    #[test]
    fn test_event_line() {
        let rec = record("a.txt", 10, UploadStatus::Uploading, 30);
        let progress = UploadEvent::Progress {
            id: rec.id,
            percent: 30,
            timestamp: Utc::now(),
        };
        assert!(event_line(&progress, Some(&rec)).unwrap().ends_with("a.txt"));

        let removed = UploadEvent::Removed {
            id: rec.id,
            last_status: UploadStatus::Uploading,
            timestamp: Utc::now(),
        };
        assert!(event_line(&removed, Some(&rec)).is_none());
    }

    #[test]
    fn test_summary() {
        let records = vec![
            record("a", 1, UploadStatus::Success, 99),
            record("b", 1, UploadStatus::Error, 0),
            record("c", 1, UploadStatus::Uploading, 10),
        ];
        let summary = Summary::of(&records, 2);
        assert_eq!(
            summary,
            Summary {
                succeeded: 1,
                failed: 1,
                pending: 1,
                skipped: 2
            }
        );
        assert_eq!(
            summary.to_string(),
            "1 uploaded, 1 failed, 2 skipped, 1 unfinished"
        );
    }
}
