use thiserror::Error;

use crate::domain::DeliveryError;
use crate::strategy::StrategyKind;

/// Faults of the throttling engine itself.
///
/// Caller-level failures are [`crate::domain::CallError`] values and never
/// show up here.
#[derive(Debug, Error)]
pub enum ThrottleError {
    /// The responder rejected a failure; the caller will never hear back.
    #[error("failed to invoke exception() on {task}")]
    ExceptionUndeliverable {
        task: String,
        #[source]
        source: DeliveryError,
    },

    /// Both the response and the fallback exception delivery failed.
    #[error("failed to invoke exception() on {task} after failed response() ({response})")]
    CompletionLost {
        task: String,
        response: DeliveryError,
        #[source]
        source: DeliveryError,
    },

    #[error("{operation} is not supported by the {strategy} throttling strategy")]
    Unsupported {
        strategy: &'static str,
        operation: &'static str,
    },

    #[error("throttling strategy `{0}` is not implemented")]
    UnsupportedStrategy(StrategyKind),

    #[error("execution slot requires a tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("execution slot `{slot}` panicked: {reason}")]
    SlotPanicked { slot: String, reason: String },

    /// The runtime cancelled the worker, usually because it is shutting down.
    #[error("execution slot `{slot}` was cancelled")]
    SlotCancelled { slot: String },

    #[error("invalid throttle config: {0}")]
    InvalidConfig(String),

    #[error("duplicate method registered for operation={0}")]
    DuplicateMethod(String),
}

impl ThrottleError {
    /// True when some caller was, or may have been, left without any completion.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ThrottleError::ExceptionUndeliverable { .. }
                | ThrottleError::CompletionLost { .. }
                | ThrottleError::SlotPanicked { .. }
                | ThrottleError::SlotCancelled { .. }
        )
    }
}
