//! Progress/result events a task emits while it runs.

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    BatchStarted,
    BatchDone,
    BatchFailed,
    BatchSkipped,
    BatchCanceled,
}

/// One reported event. `file_url` is always the assignment's original item
/// path, never an intermediate temp file, so a caller watching progress for
/// an item never needs to know about the chain's internal file names.
#[derive(Debug, Clone)]
pub struct ActionEvent {
    pub status: ActionStatus,
    pub message: String,
    pub file_url: PathBuf,
    pub dest_url: Option<PathBuf>,
    /// Set when the destination file already held the tool chain's output
    /// (an in-place metadata edit) and the task therefore performed no
    /// binary write of its own.
    pub no_write: bool,
}

impl ActionEvent {
    pub fn new(status: ActionStatus, file_url: PathBuf, message: impl Into<String>) -> Self {
        ActionEvent { status, message: message.into(), file_url, dest_url: None, no_write: false }
    }

    pub fn with_dest(mut self, dest_url: PathBuf) -> Self {
        self.dest_url = Some(dest_url);
        self
    }

    pub fn with_no_write(mut self, no_write: bool) -> Self {
        self.no_write = no_write;
        self
    }
}
