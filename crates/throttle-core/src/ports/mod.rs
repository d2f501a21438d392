//! Ports - capabilities the surrounding RPC layer provides.
//!
//! The throttling core depends only on these traits; the RPC boundary (or the
//! adapters in [`crate::impls`]) supplies the implementations.

pub mod invoker;
pub mod responder;

pub use self::invoker::Invoker;
pub use self::responder::Responder;
