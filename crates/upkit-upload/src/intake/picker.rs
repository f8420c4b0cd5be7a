//! File-picker intake surface.

use upkit_core::types::RawFile;

use crate::intake::{AcceptFilter, IntakeTarget};

/// File chooser that forwards each selection to an [`IntakeTarget`].
///
/// The chooser holds no value between selections, so picking the same file
/// again is forwarded again.
#[derive(Debug)]
pub struct FilePicker<T> {
    target: T,
    accept: AcceptFilter,
    multiple: bool,
}

impl<T: IntakeTarget> FilePicker<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            accept: AcceptFilter::default(),
            multiple: true,
        }
    }

    pub fn accept(mut self, accept: &str) -> Self {
        self.accept = AcceptFilter::parse(accept);
        self
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    /// Type hint handed to the dialog.
    pub fn accept_filter(&self) -> &AcceptFilter {
        &self.accept
    }

    pub fn allows_multiple(&self) -> bool {
        self.multiple
    }

    /// Handle a selection from the dialog. Returns how many files were
    /// forwarded.
    ///
    /// A cancelled dialog (no files) forwards nothing.
    pub fn select(&self, files: Vec<RawFile>) -> usize {
        let files: Vec<RawFile> = if self.multiple {
            files
        } else {
            files.into_iter().take(1).collect()
        };
        if files.is_empty() {
            return 0;
        }

        let count = files.len();
        tracing::debug!(count, "Files picked");
        self.target.accept_files(files);
        count
    }

    pub fn target(&self) -> &T {
        &self.target
    }
}
