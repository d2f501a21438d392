//! OneshotResponder - completes a call through a `tokio::sync::oneshot`.

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::warn;

use crate::domain::{CallError, DeliveryError};
use crate::ports::Responder;

/// What the caller eventually receives.
pub type CallResult = Result<Option<Value>, CallError>;

/// Responder for callers that await their result in-process.
///
/// The first completion is forwarded; any further one is a
/// [`DeliveryError`]. A caller that stopped listening is not an error.
pub struct OneshotResponder {
    tx: Option<oneshot::Sender<CallResult>>,
}

impl OneshotResponder {
    pub fn channel() -> (Self, oneshot::Receiver<CallResult>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }

    fn send(&mut self, result: CallResult) -> Result<(), DeliveryError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| DeliveryError::new("call already completed"))?;

        if tx.send(result).is_err() {
            warn!("caller dropped its receiver; completion discarded");
        }
        Ok(())
    }
}

impl Responder for OneshotResponder {
    fn respond(&mut self, value: Option<Value>) -> Result<(), DeliveryError> {
        self.send(Ok(value))
    }

    fn fail(&mut self, error: CallError) -> Result<(), DeliveryError> {
        self.send(Err(error))
    }
}
