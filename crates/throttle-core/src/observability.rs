use serde::{Deserialize, Serialize};

/// Point-in-time counters of a task queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Waiting right now.
    pub queued: usize,
    pub enqueued: u64,
    pub dequeued: u64,
    /// Cancellations delivered at submission or at shutdown.
    pub cancelled: u64,
    pub shut_down: bool,
}
