//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{CallContext, CallError, DeliveryError, ServiceCall, ServiceInterface};
use crate::ports::{Invoker, Responder};

pub struct TestService;

impl ServiceInterface for TestService {
    fn service_name(&self) -> &str {
        "TestService"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Response(Option<Value>),
    Exception(CallError),
}

#[derive(Debug, Clone, Copy)]
pub enum DeliveryMode {
    Accept,
    RejectResponse,
    RejectAll,
}

/// Collects completions of every responder it hands out, in delivery order.
#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Vec<Completion>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn responder(&self, mode: DeliveryMode) -> RecordingResponder {
        RecordingResponder {
            log: Arc::clone(&self.log),
            mode,
        }
    }

    pub fn completions(&self) -> Vec<Completion> {
        self.log.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    /// Wait until at least `n` completions were recorded.
    pub async fn wait_for(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.len() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("completions did not arrive in time");
    }
}

pub struct RecordingResponder {
    log: Arc<Mutex<Vec<Completion>>>,
    mode: DeliveryMode,
}

impl Responder for RecordingResponder {
    fn respond(&mut self, value: Option<Value>) -> Result<(), DeliveryError> {
        match self.mode {
            DeliveryMode::Accept => {
                self.log.lock().unwrap().push(Completion::Response(value));
                Ok(())
            }
            DeliveryMode::RejectResponse | DeliveryMode::RejectAll => {
                Err(DeliveryError::new("response rejected"))
            }
        }
    }

    fn fail(&mut self, error: CallError) -> Result<(), DeliveryError> {
        match self.mode {
            DeliveryMode::Accept | DeliveryMode::RejectResponse => {
                self.log.lock().unwrap().push(Completion::Exception(error));
                Ok(())
            }
            DeliveryMode::RejectAll => Err(DeliveryError::new("exception rejected")),
        }
    }
}

enum Script {
    Return(Value),
    Fail(CallError),
    Echo,
}

/// Invoker with a fixed behaviour; tracks how many calls overlap.
pub struct ScriptedInvoker {
    script: Script,
    void: bool,
    escalate: bool,
    delay: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ScriptedInvoker {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            void: false,
            escalate: false,
            delay: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn returning(value: Value) -> Self {
        Self::with_script(Script::Return(value))
    }

    pub fn failing(error: CallError) -> Self {
        Self::with_script(Script::Fail(error))
    }

    /// Returns the first argument.
    pub fn echo() -> Self {
        Self::with_script(Script::Echo)
    }

    pub fn void(mut self) -> Self {
        self.void = true;
        self
    }

    /// Values with an `"error"` field are escalated to a user exception.
    pub fn escalating_errors(mut self) -> Self {
        self.escalate = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Highest number of overlapping `invoke` calls seen so far.
    pub fn peak_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.peak)
    }
}

#[async_trait]
impl Invoker for ScriptedInvoker {
    async fn invoke(
        &self,
        _service: &dyn ServiceInterface,
        _context: &CallContext,
        args: &[Value],
    ) -> Result<Value, CallError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.script {
            Script::Return(value) => Ok(value.clone()),
            Script::Fail(err) => Err(err.clone()),
            Script::Echo => Ok(args.first().cloned().unwrap_or(Value::Null)),
        }
    }

    fn is_void(&self, _context: &CallContext) -> bool {
        self.void
    }

    fn check_result(&self, _context: &CallContext, value: &Value) -> Result<(), CallError> {
        match value.get("error").and_then(Value::as_str) {
            Some(msg) if self.escalate => Err(CallError::user("Escalated", msg)),
            _ => Ok(()),
        }
    }
}

pub fn call_with(invoker: ScriptedInvoker) -> ServiceCall {
    call_with_args(Arc::new(invoker), Vec::new())
}

pub fn call_with_args(invoker: Arc<dyn Invoker>, args: Vec<Value>) -> ServiceCall {
    ServiceCall::new(
        Arc::new(TestService),
        invoker,
        CallContext::new("doWork", 1),
        args,
    )
}
