use std::path::PathBuf;

use bqm_task::{ActionEvent, TaskOutcome};

/// Lifecycle events the pool reports over its `mpsc` channel. Many
/// producers (rayon worker threads) feed one consumer, matching the
/// "single consumer multiplexing many producers" shape described for the
/// pool's event channel: `Starting`/`Finished` can arrive interleaved
/// across items with no ordering guarantee between different items, but
/// `QueueProcessed` for a given queue is only ever sent after every one of
/// that queue's `Finished` events has been sent, and `AllDone` only after
/// every queue's `QueueProcessed`.
#[derive(Debug, Clone)]
pub enum PoolEvent {
    Starting { item: PathBuf },
    Progress { item: PathBuf, event: ActionEvent },
    Finished { item: PathBuf, outcome: TaskOutcome },
    QueueProcessed { queue_title: String },
    AllDone,
}
