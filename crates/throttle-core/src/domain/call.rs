use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::hint::{ResourceHint, ResourceHints};
use crate::ports::Invoker;

/// A service implementation the RPC layer dispatches into.
///
/// The core never looks inside; invokers downcast through `Any` when they
/// need the concrete type.
pub trait ServiceInterface: Any + Send + Sync {
    fn service_name(&self) -> &str;
}

/// Name of the invoked operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Operation(String);

impl Operation {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-request metadata the RPC layer hands over with each call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    operation: Operation,
    request_id: i64,
    #[serde(default)]
    ctx: BTreeMap<String, String>,
}

impl CallContext {
    pub fn new(operation: impl Into<String>, request_id: i64) -> Self {
        Self {
            operation: Operation::new(operation),
            request_id,
            ctx: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ctx.insert(key.into(), value.into());
        self
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn request_id(&self) -> i64 {
        self.request_id
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.ctx.get(key).map(String::as_str)
    }
}

/// Everything needed to perform one method call later.
///
/// Opaque to the queue: only the task and the invoker read it.
#[derive(Clone)]
pub struct ServiceCall {
    service: Arc<dyn ServiceInterface>,
    invoker: Arc<dyn Invoker>,
    context: CallContext,
    args: Vec<Value>,
    hints: ResourceHints,
}

impl ServiceCall {
    pub fn new(
        service: Arc<dyn ServiceInterface>,
        invoker: Arc<dyn Invoker>,
        context: CallContext,
        args: Vec<Value>,
    ) -> Self {
        Self {
            service,
            invoker,
            context,
            args,
            hints: ResourceHints::default(),
        }
    }

    pub fn with_hints(mut self, io: impl Into<ResourceHint>, db: impl Into<ResourceHint>) -> Self {
        self.hints = ResourceHints::new(io, db);
        self
    }

    pub fn service(&self) -> &dyn ServiceInterface {
        self.service.as_ref()
    }

    pub fn invoker(&self) -> &dyn Invoker {
        self.invoker.as_ref()
    }

    pub fn context(&self) -> &CallContext {
        &self.context
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn hints(&self) -> ResourceHints {
        self.hints
    }
}

impl fmt::Debug for ServiceCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCall")
            .field("service", &self.service.service_name())
            .field("context", &self.context)
            .field("args", &self.args)
            .field("hints", &self.hints)
            .finish()
    }
}

impl fmt::Display for ServiceCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}",
            self.service.service_name(),
            self.context.operation()
        )
    }
}
