//! Queue module: the dispatch queue between admission and execution.

mod memory;

pub use memory::TaskQueue;

use serde::{Deserialize, Serialize};

use crate::domain::{CallError, ResourceHint};
use crate::error::ThrottleError;

/// What the queue needs from an item it holds.
///
/// The queue never runs items; it only hands them to a worker or cancels
/// them through their exception path.
pub trait Pending: Send + 'static {
    /// Complete the item with `error`. Consumes it: an item is completed once.
    fn exception(self, error: CallError) -> Result<(), ThrottleError>;

    fn io_intensive(&self) -> ResourceHint;

    fn db_intensive(&self) -> ResourceHint;
}

/// Result of handing an item to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Admission {
    /// Appended; a worker will pick it up.
    Queued,
    /// The queue is shut down; the item was already failed with
    /// [`CallError::Cancelled`].
    Cancelled,
}
