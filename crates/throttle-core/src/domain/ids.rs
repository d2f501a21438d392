//! Task identifier.
//!
//! IDs are ULID based: they sort by creation time, which keeps log lines for
//! consecutive submissions in submission order.

use std::fmt;
use ulid::Ulid;

/// Identifier of one admitted invocation. Displays as `task-<ulid>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(Ulid);

impl TaskId {
    /// Fresh ID stamped with the current time.
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}
