//! Responder port - the caller's completion handler.

use serde_json::Value;

use crate::domain::{CallError, DeliveryError};

/// Completion sink for one asynchronous call.
///
/// Built by the RPC boundary for every request. A task calls exactly one of
/// the two methods, except when `respond` itself fails: the task then reports
/// that failure through `fail`.
pub trait Responder: Send + 'static {
    /// Deliver the result. `None` for void operations.
    fn respond(&mut self, value: Option<Value>) -> Result<(), DeliveryError>;

    /// Deliver a failure.
    fn fail(&mut self, error: CallError) -> Result<(), DeliveryError>;
}

impl<R: Responder + ?Sized> Responder for Box<R> {
    fn respond(&mut self, value: Option<Value>) -> Result<(), DeliveryError> {
        (**self).respond(value)
    }

    fn fail(&mut self, error: CallError) -> Result<(), DeliveryError> {
        (**self).fail(error)
    }
}
