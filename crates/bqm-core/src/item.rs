//! Host-supplied metadata about a queue item, kept separate from the
//! assignment itself since the queue/task state machine never requires it;
//! only the MJPEG overlay feature (`bqm-mjpeg`) reads it.

use serde::{Deserialize, Serialize};

/// A snapshot of the metadata a host application's info interface would
/// supply for an item. All fields are optional because a miss (item not in
/// the host's database, or a field never set) is a normal, common case, not
/// an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub title: Option<String>,
    pub comment: Option<String>,
    pub tags: Vec<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub lens_model: Option<String>,
    pub sensitivity_iso: Option<u32>,
    pub aperture: Option<f64>,
    pub focal_length: Option<f64>,
    pub rating: Option<u8>,
    pub date_taken: Option<time::OffsetDateTime>,
}
