//! Domain model (ids, call descriptors, resource hints, caller-facing errors).

pub mod call;
pub mod errors;
pub mod hint;
pub mod ids;

pub use call::{CallContext, Operation, ServiceCall, ServiceInterface};
pub use errors::{CallError, DeliveryError, InternalException, UserException};
pub use hint::{ResourceHint, ResourceHints};
pub use ids::TaskId;
