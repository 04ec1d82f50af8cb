//! Queue tracking and destination resolution.

pub mod destination;
pub mod error;
pub mod queue;

pub use destination::{apply_renaming_rule, resolve_destination, DestinationResolution};
pub use error::QueueError;
pub use queue::Queue;
