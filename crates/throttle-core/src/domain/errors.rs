//! Errors that travel to a caller's responder.
//!
//! These are values, not engine faults: they end up in `Responder::fail`.
//! Faults of the throttling engine itself live in [`crate::error`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A recognized, service-defined failure raised by the invoked method.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct UserException {
    kind: String,
    message: String,
}

impl UserException {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Server-side failure not attributable to the caller.
///
/// `cause` holds the rendered error chain of whatever went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct InternalException {
    message: String,
    cause: Option<String>,
}

impl InternalException {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Record `err` and its sources as the cause.
    pub fn with_cause(mut self, err: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = err.to_string();
        let mut source = err.source();
        while let Some(next) = source {
            chain.push_str(": ");
            chain.push_str(&next.to_string());
            source = next.source();
        }
        self.cause = Some(chain);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }
}

/// Everything a responder's exception sink can receive.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CallError {
    #[error(transparent)]
    User(#[from] UserException),

    #[error("internal error: {0}")]
    Internal(#[from] InternalException),

    /// The call was discarded because the queue shut down; it will never run.
    #[error("call cancelled: dispatch queue is shut down")]
    Cancelled,
}

impl CallError {
    pub fn user(kind: impl Into<String>, message: impl Into<String>) -> Self {
        CallError::User(UserException::new(kind, message))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CallError::Internal(InternalException::new(message))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CallError::Cancelled)
    }
}

/// A responder could not hand a completion to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("completion delivery failed: {reason}")]
pub struct DeliveryError {
    reason: String,
}

impl DeliveryError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}
