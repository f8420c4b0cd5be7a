//! Drag-and-drop intake surface.

use upkit_core::types::RawFile;

use crate::intake::IntakeTarget;

/// A drag gesture delivered to the drop zone.
#[derive(Debug, Clone, Default)]
pub struct DragEvent {
    pub files: Vec<RawFile>,
    default_prevented: bool,
}

impl DragEvent {
    pub fn new(files: Vec<RawFile>) -> Self {
        Self {
            files,
            default_prevented: false,
        }
    }

    /// Stop the host from handling the gesture itself (e.g. opening a
    /// dropped file).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Drop zone that forwards dropped files to an [`IntakeTarget`].
#[derive(Debug)]
pub struct DragIntake<T> {
    target: T,
    drag_over: bool,
}

impl<T: IntakeTarget> DragIntake<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            drag_over: false,
        }
    }

    /// Whether a drag is hovering the zone. Drives highlight styling.
    pub fn is_drag_over(&self) -> bool {
        self.drag_over
    }

    pub fn drag_enter(&mut self, event: &mut DragEvent) {
        event.prevent_default();
        self.drag_over = true;
    }

    /// Hover updates; the default must be cancelled for a drop to happen.
    pub fn drag_over(&mut self, event: &mut DragEvent) {
        event.prevent_default();
        self.drag_over = true;
    }

    pub fn drag_leave(&mut self, event: &mut DragEvent) {
        event.prevent_default();
        self.drag_over = false;
    }

    /// Forward the dropped files verbatim. Returns how many were forwarded.
    pub fn drop(&mut self, event: &mut DragEvent) -> usize {
        event.prevent_default();
        self.drag_over = false;
        let files = std::mem::take(&mut event.files);
        let count = files.len();
        tracing::debug!(count, "Files dropped");
        self.target.accept_files(files);
        count
    }

    pub fn target(&self) -> &T {
        &self.target
    }
}
