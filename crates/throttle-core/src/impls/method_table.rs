//! MethodTable - an `Invoker` that dispatches by operation name.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use crate::domain::{CallContext, CallError, Operation, ServiceInterface};
use crate::error::ThrottleError;
use crate::ports::Invoker;

/// Implementation of one operation.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    async fn call(
        &self,
        service: &dyn ServiceInterface,
        context: &CallContext,
        args: &[Value],
    ) -> Result<Value, CallError>;

    fn returns_void(&self) -> bool {
        false
    }
}

/// Registry of handlers (operation -> handler).
///
/// Filled during initialization, read-only afterwards, so no locks.
#[derive(Default)]
pub struct MethodTable {
    handlers: HashMap<Operation, Arc<dyn MethodHandler>>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        operation: impl Into<String>,
        handler: Arc<dyn MethodHandler>,
    ) -> Result<(), ThrottleError> {
        let operation = Operation::new(operation);
        if self.handlers.contains_key(&operation) {
            return Err(ThrottleError::DuplicateMethod(operation.to_string()));
        }
        self.handlers.insert(operation, handler);
        Ok(())
    }

    /// Register a synchronous closure returning a value.
    pub fn register_fn<F>(&mut self, operation: impl Into<String>, f: F) -> Result<(), ThrottleError>
    where
        F: Fn(&[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.register(operation, Arc::new(FnHandler { f, void: false }))
    }

    /// Register a synchronous closure whose result is not sent back.
    pub fn register_void_fn<F>(
        &mut self,
        operation: impl Into<String>,
        f: F,
    ) -> Result<(), ThrottleError>
    where
        F: Fn(&[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        self.register(operation, Arc::new(FnHandler { f, void: true }))
    }

    pub fn get(&self, operation: &Operation) -> Option<&Arc<dyn MethodHandler>> {
        self.handlers.get(operation)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl Invoker for MethodTable {
    async fn invoke(
        &self,
        service: &dyn ServiceInterface,
        context: &CallContext,
        args: &[Value],
    ) -> Result<Value, CallError> {
        let operation = context.operation();
        let handler = self.get(operation).ok_or_else(|| {
            CallError::internal(format!(
                "no handler registered for operation={operation} on {}",
                service.service_name()
            ))
        })?;

        trace!(%operation, "dispatching to handler");
        handler.call(service, context, args).await
    }

    fn is_void(&self, context: &CallContext) -> bool {
        self.get(context.operation())
            .is_some_and(|handler| handler.returns_void())
    }
}

struct FnHandler<F> {
    f: F,
    void: bool,
}

#[async_trait]
impl<F> MethodHandler for FnHandler<F>
where
    F: Fn(&[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
{
    async fn call(
        &self,
        _service: &dyn ServiceInterface,
        _context: &CallContext,
        args: &[Value],
    ) -> Result<Value, CallError> {
        (self.f)(args)
    }

    fn returns_void(&self) -> bool {
        self.void
    }
}
