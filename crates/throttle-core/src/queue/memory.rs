//! In-memory FIFO with a one-shot shutdown.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::{debug, error, info, trace, warn};

use super::{Admission, Pending};
use crate::domain::CallError;
use crate::error::ThrottleError;
use crate::observability::QueueStats;

/// Unbounded FIFO shared by producers and the execution slot.
///
/// Invariants:
/// - the `done` flag is only read and the backlog only drained while the
///   lock is held, so nothing can be appended after the shutdown drain;
/// - every item accepted by `enqueue` is either returned by `dequeue` or
///   cancelled, never both.
pub struct TaskQueue<T> {
    items: Mutex<VecDeque<T>>,
    done: AtomicBool,
    notify: Notify,
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    cancelled: AtomicU64,
}

impl<T: Pending> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            done: AtomicBool::new(false),
            notify: Notify::new(),
            enqueued: AtomicU64::new(0),
            dequeued: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
        }
    }

    /// Append `item`, or cancel it inline if the queue is shut down.
    ///
    /// Never waits for a worker. Returns `Err` only when the inline
    /// cancellation could not be delivered.
    pub fn enqueue(&self, item: T) -> Result<Admission, ThrottleError> {
        let rejected = {
            let mut items = self.lock();
            if self.is_shut_down() {
                item
            } else {
                items.push_back(item);
                let depth = items.len();
                drop(items);

                self.enqueued.fetch_add(1, Ordering::Relaxed);
                self.notify.notify_one();
                trace!(depth, "enqueued");
                return Ok(Admission::Queued);
            }
        };

        debug!("queue is shut down; cancelling submission");
        rejected.exception(CallError::Cancelled)?;
        self.cancelled.fetch_add(1, Ordering::Relaxed);
        Ok(Admission::Cancelled)
    }

    /// Wait for the head item. `None` once the queue is shut down.
    pub async fn dequeue(&self) -> Option<T> {
        loop {
            {
                let mut items = self.lock();
                if self.is_shut_down() {
                    return None;
                }
                if let Some(item) = items.pop_front() {
                    self.dequeued.fetch_add(1, Ordering::Relaxed);
                    return Some(item);
                }
            }

            // A stored permit covers a push that lands between the check
            // above and this await; wakeups with nothing queued just loop.
            self.notify.notified().await;
        }
    }

    /// Shut down once and cancel everything still waiting.
    ///
    /// Returns how many items were cancelled; repeated calls return `Ok(0)`.
    /// Every drained item is cancelled even if some deliveries fail; the first
    /// failure is returned.
    pub fn shutdown(&self) -> Result<usize, ThrottleError> {
        if self
            .done
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("queue already shut down");
            return Ok(0);
        }

        let drained: Vec<T> = self.lock().drain(..).collect();
        // Wake a waiting worker so it observes the flag and exits.
        self.notify.notify_waiters();
        self.notify.notify_one();

        let count = drained.len();
        let mut first_err = None;
        for item in drained {
            match item.exception(CallError::Cancelled) {
                Ok(()) => {
                    self.cancelled.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => {
                    error!(error = %err, "failed to cancel queued task");
                    first_err.get_or_insert(err);
                }
            }
        }

        info!(cancelled = count, "task queue shut down");
        match first_err {
            Some(err) => Err(err),
            None => Ok(count),
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            queued: self.len(),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dequeued: self.dequeued.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            shut_down: self.is_shut_down(),
        }
    }

    /// A panic while holding the lock must not lose queued items: recover
    /// the guard and carry on.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            warn!("task queue lock poisoned; recovering");
            poisoned.into_inner()
        })
    }
}

impl<T: Pending> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
