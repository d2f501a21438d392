use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};
use tracing::{Instrument, debug, error, info, info_span};

use crate::error::ThrottleError;
use crate::queue::TaskQueue;
use crate::task::Task;

/// Single worker bound to one queue.
///
/// Exactly one consumer runs tasks one after another, which is what bounds
/// execution to one in-flight call. The worker exits when the queue shuts
/// down, or when a task could not complete its caller at all; in the latter
/// case it shuts the queue down first so nothing waits forever.
pub struct ExecutionSlot {
    name: String,
    busy: Arc<AtomicBool>,
    join: JoinHandle<Result<(), ThrottleError>>,
}

impl ExecutionSlot {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(name: impl Into<String>, queue: Arc<TaskQueue<Task>>) -> Result<Self, ThrottleError> {
        let runtime = Handle::try_current()?;
        let name = name.into();
        let busy = Arc::new(AtomicBool::new(false));

        let worker = runtime.spawn(
            slot_loop(Arc::clone(&queue), Arc::clone(&busy))
                .instrument(info_span!("execution_slot", slot = %name)),
        );

        // Watches the worker: a panic must not strand queued callers.
        let join = runtime.spawn({
            let name = name.clone();
            async move {
                match worker.await {
                    Ok(result) => result,
                    Err(join_err) => {
                        error!(slot = %name, error = %join_err, "execution slot stopped abnormally; shutting queue down");
                        if let Err(err) = queue.shutdown() {
                            error!(slot = %name, error = %err, "cancelling queued tasks failed");
                        }
                        Err(join_failure(name, join_err))
                    }
                }
            }
        });

        info!(slot = %name, "execution slot started");
        Ok(Self { name, busy, join })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a task is executing right now.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the worker to exit. Does not shut the queue down by itself.
    pub async fn join(self) -> Result<(), ThrottleError> {
        match self.join.await {
            Ok(result) => result,
            Err(err) => Err(join_failure(self.name, err)),
        }
    }
}

fn join_failure(slot: String, err: JoinError) -> ThrottleError {
    if err.is_panic() {
        ThrottleError::SlotPanicked {
            slot,
            reason: err.to_string(),
        }
    } else {
        ThrottleError::SlotCancelled { slot }
    }
}

async fn slot_loop(queue: Arc<TaskQueue<Task>>, busy: Arc<AtomicBool>) -> Result<(), ThrottleError> {
    while let Some(task) = queue.dequeue().await {
        let id = task.id();
        busy.store(true, Ordering::Release);
        let result = task.run().await;
        busy.store(false, Ordering::Release);

        if let Err(err) = result {
            error!(task = %id, error = %err, "caller left without completion; stopping execution slot");
            if let Err(cancel_err) = queue.shutdown() {
                error!(error = %cancel_err, "cancelling queued tasks failed");
            }
            return Err(err);
        }
    }

    debug!("queue shut down; execution slot exiting");
    Ok(())
}
