//! throttle-core
//!
//! Execution throttling for asynchronous RPC dispatch: calls are admitted by a
//! [`ThrottlingStrategy`], queued, and executed by a worker that completes
//! each caller exactly once.
//!
//! ```text
//! RPC layer ─► ThrottlingStrategy::service_call ─► Task ─► TaskQueue::enqueue
//!                                                              │
//!              Responder::respond / fail ◄─ Task::run ◄─ ExecutionSlot (dequeue)
//! ```
//!
//! # Modules
//! - **domain**: call descriptors, task ids, resource hints, caller-facing errors
//! - **ports**: `Invoker` and `Responder` capabilities supplied by the RPC layer
//! - **task**: the completion protocol of one call
//! - **queue**: FIFO with one-shot shutdown
//! - **slot**: the single execution worker
//! - **strategy**: admission policies (serial)
//! - **impls**: `MethodTable` and `OneshotResponder`

pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;
pub mod slot;
pub mod strategy;
pub mod task;

#[cfg(test)]
mod testing;

pub use config::ThrottleConfig;
pub use error::ThrottleError;
pub use queue::{Admission, TaskQueue};
pub use slot::ExecutionSlot;
pub use strategy::{SerialThrottlingStrategy, StrategyKind, ThrottlingStrategy};
pub use task::Task;
