//! Task: one admitted call plus its completion protocol.
//!
//! A task is completed exactly once. Both completion paths take `self` by
//! value, so a task that has delivered anything cannot be completed again.
//!
//! ```text
//! run()
//!   ├─ invoke ─ Ok(v) ─ check_result ─ Ok  ──► response(v)
//!   │                                 └ Err ──► exception(e)
//!   └─ invoke ─ Err(e) ───────────────────────► exception(e)
//!
//! response(v)
//!   ├─ respond Ok  ──► done
//!   └─ respond Err ──► fail(Internal "Failed to invoke: <task>")
//!                        └─ Err ──► ThrottleError::CompletionLost
//! ```

use std::fmt;

use serde_json::Value;
use tracing::{debug, error, trace, warn};

use crate::domain::{
    CallError, InternalException, ResourceHint, ServiceCall, TaskId,
};
use crate::error::ThrottleError;
use crate::ports::Responder;
use crate::queue::Pending;

pub struct Task {
    id: TaskId,
    call: ServiceCall,
    responder: Box<dyn Responder>,
}

impl Task {
    pub fn new(call: ServiceCall, responder: Box<dyn Responder>) -> Self {
        Self {
            id: TaskId::generate(),
            call,
            responder,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn call(&self) -> &ServiceCall {
        &self.call
    }

    pub fn io_intensive(&self) -> ResourceHint {
        self.call.hints().io
    }

    pub fn db_intensive(&self) -> ResourceHint {
        self.call.hints().db
    }

    /// Invoke the call and complete the caller.
    ///
    /// Only returns `Err` when the caller could not be completed at all.
    pub async fn run(self) -> Result<(), ThrottleError> {
        trace!(task = %self.id, call = %self.call, "invoking");
        let call = &self.call;
        let outcome = call
            .invoker()
            .invoke(call.service(), call.context(), call.args())
            .await
            .and_then(|value| {
                call.invoker()
                    .check_result(call.context(), &value)
                    .map(|()| value)
            });

        match outcome {
            Ok(value) => self.response(value),
            Err(err) => self.exception(err),
        }
    }

    /// Deliver `value`, falling back to the exception path if delivery fails.
    pub fn response(mut self, value: Value) -> Result<(), ThrottleError> {
        let payload = if self.call.invoker().is_void(self.call.context()) {
            None
        } else {
            Some(value)
        };

        let Err(response_err) = self.responder.respond(payload) else {
            debug!(task = %self.id, "response delivered");
            return Ok(());
        };

        let task = self.to_string();
        warn!(task = %task, error = %response_err, "response delivery failed; reporting internal error");
        let internal = InternalException::new(format!("Failed to invoke: {task}"))
            .with_cause(&response_err);

        self.responder
            .fail(CallError::Internal(internal))
            .map_err(|source| {
                error!(task = %task, error = %source, "exception delivery failed after failed response");
                ThrottleError::CompletionLost {
                    task,
                    response: response_err,
                    source,
                }
            })
    }

    /// Deliver `error` to the caller's exception sink.
    pub fn exception(mut self, error: CallError) -> Result<(), ThrottleError> {
        let cancelled = error.is_cancelled();
        match self.responder.fail(error) {
            Ok(()) => {
                debug!(task = %self.id, cancelled, "exception delivered");
                Ok(())
            }
            Err(source) => {
                let task = self.to_string();
                error!(task = %task, error = %source, "exception delivery failed");
                Err(ThrottleError::ExceptionUndeliverable { task, source })
            }
        }
    }
}

impl Pending for Task {
    fn exception(self, error: CallError) -> Result<(), ThrottleError> {
        Task::exception(self, error)
    }

    fn io_intensive(&self) -> ResourceHint {
        Task::io_intensive(self)
    }

    fn db_intensive(&self) -> ResourceHint {
        Task::db_intensive(self)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.call)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("call", &self.call)
            .finish_non_exhaustive()
    }
}
