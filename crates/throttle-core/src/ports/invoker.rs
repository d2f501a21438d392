//! Invoker port - performs the actual method call on a service.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{CallContext, CallError, ServiceInterface};

/// Calls into a service implementation and maps the outcome.
///
/// Implementations map every failure they can recognize into a
/// [`CallError`]; the throttling core only routes it to the caller.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(
        &self,
        service: &dyn ServiceInterface,
        context: &CallContext,
        args: &[Value],
    ) -> Result<Value, CallError>;

    /// Whether the operation in `context` returns nothing meaningful.
    fn is_void(&self, context: &CallContext) -> bool;

    /// Escalate a domain failure carried inside a returned value.
    ///
    /// Called after a successful `invoke` and before the response is
    /// delivered. The default accepts every value.
    fn check_result(&self, _context: &CallContext, _value: &Value) -> Result<(), CallError> {
        Ok(())
    }
}
