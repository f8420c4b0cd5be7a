//! Intake surfaces.
//!
//! Turn user gestures (drag-and-drop, file picker, command-line paths) into
//! batches of raw files. Intake never validates; that is the job of the
//! orchestrator's pre-flight hook.

pub mod accept;
pub mod drag;
pub mod paths;
pub mod picker;

use upkit_core::types::RawFile;

use crate::orchestrator::UploadOrchestrator;

pub use accept::AcceptFilter;
pub use drag::{DragEvent, DragIntake};
pub use paths::{PathIntake, PathIntakeReport};
pub use picker::FilePicker;

/// Receiver of intake batches.
pub trait IntakeTarget {
    fn accept_files(&self, files: Vec<RawFile>);
}

impl IntakeTarget for UploadOrchestrator {
    fn accept_files(&self, files: Vec<RawFile>) {
        // Pipelines run detached; progress is observed through the record list.
        let _batch = self.submit(files);
    }
}

impl<T: IntakeTarget + ?Sized> IntakeTarget for &T {
    fn accept_files(&self, files: Vec<RawFile>) {
        (**self).accept_files(files);
    }
}
