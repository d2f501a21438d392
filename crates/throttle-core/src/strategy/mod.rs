//! Throttling strategies: the entry point the RPC layer calls per request.
//!
//! # Kinds
//! - `Serial`: one queue, one execution slot, at most one call in flight.
//! - `Pooled`, `IoPriority`: reserved names for routing policies that use
//!   the resource hints; not implemented.

mod serial;

pub use serial::SerialThrottlingStrategy;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ThrottleConfig;
use crate::domain::{CallContext, ServiceCall};
use crate::error::ThrottleError;
use crate::ports::Responder;
use crate::queue::Admission;

/// Work that is not a service call and has no responder.
#[async_trait]
pub trait Runnable: Send {
    async fn run(self: Box<Self>, context: CallContext);
}

/// Admission and scheduling policy for asynchronous calls.
#[async_trait]
pub trait ThrottlingStrategy: Send + Sync {
    /// Admit one service call. Returns before the call runs.
    fn service_call(
        &self,
        call: ServiceCall,
        responder: Box<dyn Responder>,
    ) -> Result<Admission, ThrottleError>;

    /// Admit a plain runnable.
    fn runnable_call(
        &self,
        context: CallContext,
        runnable: Box<dyn Runnable>,
    ) -> Result<(), ThrottleError>;

    /// Stop admitting and cancel everything not yet running.
    fn shutdown(&self) -> Result<usize, ThrottleError>;

    /// Shut down and wait for in-flight work to finish.
    async fn join(self: Box<Self>) -> Result<(), ThrottleError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Serial,
    Pooled,
    IoPriority,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Serial => "serial",
            StrategyKind::Pooled => "pooled",
            StrategyKind::IoPriority => "io_priority",
        };
        f.write_str(name)
    }
}

/// Build the strategy named by `config`.
pub fn build(config: &ThrottleConfig) -> Result<Box<dyn ThrottlingStrategy>, ThrottleError> {
    config.validate()?;
    match config.strategy {
        StrategyKind::Serial => Ok(Box::new(SerialThrottlingStrategy::with_config(config)?)),
        other => Err(ThrottleError::UnsupportedStrategy(other)),
    }
}
