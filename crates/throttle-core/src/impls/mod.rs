//! Impls - ready-made port implementations.
//!
//! - **MethodTable**: `Invoker` dispatching by operation name
//! - **OneshotResponder**: `Responder` backed by a oneshot channel

pub mod method_table;
pub mod oneshot;

pub use self::method_table::{MethodHandler, MethodTable};
pub use self::oneshot::{CallResult, OneshotResponder};
