use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, instrument};

use super::{Runnable, ThrottlingStrategy};
use crate::config::ThrottleConfig;
use crate::domain::{CallContext, ServiceCall};
use crate::error::ThrottleError;
use crate::observability::QueueStats;
use crate::ports::Responder;
use crate::queue::{Admission, TaskQueue};
use crate::slot::ExecutionSlot;
use crate::task::Task;

/// Allows a single invocation to run at any given time.
///
/// Calls are queued in arrival order and executed one by one on a dedicated
/// execution slot. Plain runnables are not supported. Dropping the strategy
/// shuts its queue down, which cancels the backlog and lets the slot exit.
pub struct SerialThrottlingStrategy {
    queue: Arc<TaskQueue<Task>>,
    slot_name: String,
    /// `None` only after `join` took it.
    slot: Option<ExecutionSlot>,
}

impl SerialThrottlingStrategy {
    /// Start the queue and its slot. Must be called inside a tokio runtime.
    pub fn new() -> Result<Self, ThrottleError> {
        Self::with_config(&ThrottleConfig::default())
    }

    pub fn with_config(config: &ThrottleConfig) -> Result<Self, ThrottleError> {
        let queue = Arc::new(TaskQueue::new());
        let slot = ExecutionSlot::spawn(config.slot_name.clone(), Arc::clone(&queue))?;
        Ok(Self {
            queue,
            slot_name: config.slot_name.clone(),
            slot: Some(slot),
        })
    }

    /// Same as [`ThrottlingStrategy::service_call`].
    pub fn submit(
        &self,
        call: ServiceCall,
        responder: impl Responder,
    ) -> Result<Admission, ThrottleError> {
        self.service_call(call, Box::new(responder))
    }

    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    pub fn is_busy(&self) -> bool {
        self.slot.as_ref().is_some_and(ExecutionSlot::is_busy)
    }
}

#[async_trait]
impl ThrottlingStrategy for SerialThrottlingStrategy {
    #[instrument(level = "debug", skip_all, fields(slot = %self.slot_name, call = %call))]
    fn service_call(
        &self,
        call: ServiceCall,
        responder: Box<dyn Responder>,
    ) -> Result<Admission, ThrottleError> {
        let task = Task::new(call, responder);
        debug!(task = %task.id(), "admitting");
        self.queue.enqueue(task)
    }

    fn runnable_call(
        &self,
        _context: CallContext,
        _runnable: Box<dyn Runnable>,
    ) -> Result<(), ThrottleError> {
        Err(ThrottleError::Unsupported {
            strategy: "serial",
            operation: "runnable_call",
        })
    }

    #[instrument(level = "info", skip_all, fields(slot = %self.slot_name))]
    fn shutdown(&self) -> Result<usize, ThrottleError> {
        self.queue.shutdown()
    }

    async fn join(mut self: Box<Self>) -> Result<(), ThrottleError> {
        let shutdown = self.queue.shutdown();
        let joined = match self.slot.take() {
            Some(slot) => slot.join().await,
            None => Ok(()),
        };
        // A lost completion in the worker outranks a failed cancellation here.
        joined.and(shutdown.map(|_| ()))
    }
}

impl Drop for SerialThrottlingStrategy {
    fn drop(&mut self) {
        if let Err(err) = self.queue.shutdown() {
            error!(slot = %self.slot_name, error = %err, "cancelling queued tasks on drop failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use serde_json::json;

    use crate::domain::CallError;
    use crate::testing::{
        Completion, DeliveryMode, Recorder, ScriptedInvoker, call_with, call_with_args,
    };

    struct Noop;

    #[async_trait]
    impl Runnable for Noop {
        async fn run(self: Box<Self>, _context: CallContext) {}
    }

    #[tokio::test]
    async fn response_carries_returned_value() {
        let recorder = Recorder::new();
        let strategy = SerialThrottlingStrategy::new().unwrap();

        let admission = strategy
            .submit(
                call_with(ScriptedInvoker::returning(json!(42))),
                recorder.responder(DeliveryMode::Accept),
            )
            .unwrap();
        assert_eq!(admission, Admission::Queued);

        recorder.wait_for(1).await;
        Box::new(strategy).join().await.unwrap();
        assert_eq!(recorder.completions(), vec![Completion::Response(Some(json!(42)))]);
    }

    #[tokio::test]
    async fn domain_error_goes_to_exception() {
        let recorder = Recorder::new();
        let strategy = SerialThrottlingStrategy::new().unwrap();
        let err = CallError::user("ValidationException", "E");

        strategy
            .submit(
                call_with(ScriptedInvoker::failing(err.clone())),
                recorder.responder(DeliveryMode::Accept),
            )
            .unwrap();

        recorder.wait_for(1).await;
        Box::new(strategy).join().await.unwrap();
        assert_eq!(recorder.completions(), vec![Completion::Exception(err)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_runs_two_calls_at_once() {
        let recorder = Recorder::new();
        let strategy = SerialThrottlingStrategy::new().unwrap();
        let invoker = Arc::new(ScriptedInvoker::echo().with_delay(Duration::from_millis(5)));
        let peak = invoker.peak_handle();

        for n in 0..10 {
            strategy
                .submit(
                    call_with_args(invoker.clone(), vec![json!(n)]),
                    recorder.responder(DeliveryMode::Accept),
                )
                .unwrap();
        }

        recorder.wait_for(10).await;
        Box::new(strategy).join().await.unwrap();

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        let expected: Vec<_> = (0..10)
            .map(|n| Completion::Response(Some(json!(n))))
            .collect();
        assert_eq!(recorder.completions(), expected);
    }

    #[tokio::test]
    async fn every_task_completes_exactly_once_across_shutdown() {
        let recorder = Recorder::new();
        let strategy = SerialThrottlingStrategy::new().unwrap();
        let invoker = Arc::new(ScriptedInvoker::echo().with_delay(Duration::from_millis(20)));

        for n in 0..5 {
            strategy
                .submit(
                    call_with_args(invoker.clone(), vec![json!(n)]),
                    recorder.responder(DeliveryMode::Accept),
                )
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(30)).await;
        strategy.shutdown().unwrap();
        Box::new(strategy).join().await.unwrap();

        // The call in flight at shutdown still responds after the backlog
        // was cancelled.
        let completions = recorder.completions();
        assert_eq!(completions.len(), 5);
        let responded = completions
            .iter()
            .filter(|c| matches!(c, Completion::Response(Some(_))))
            .count();
        let cancelled = completions
            .iter()
            .filter(|c| **c == Completion::Exception(CallError::Cancelled))
            .count();
        assert!(responded >= 1);
        assert!(cancelled >= 1);
        assert_eq!(responded + cancelled, 5);
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_cancelled_inline() {
        let recorder = Recorder::new();
        let strategy = SerialThrottlingStrategy::new().unwrap();
        strategy.shutdown().unwrap();

        let admission = strategy
            .submit(
                call_with(ScriptedInvoker::returning(json!(1))),
                recorder.responder(DeliveryMode::Accept),
            )
            .unwrap();

        assert_eq!(admission, Admission::Cancelled);
        assert_eq!(
            recorder.completions(),
            vec![Completion::Exception(CallError::Cancelled)]
        );
        assert_eq!(strategy.stats().dequeued, 0);
    }

    #[tokio::test]
    async fn shutdown_twice_is_harmless() {
        let strategy = SerialThrottlingStrategy::new().unwrap();
        assert_eq!(strategy.shutdown().unwrap(), 0);
        assert_eq!(strategy.shutdown().unwrap(), 0);
        Box::new(strategy).join().await.unwrap();
    }

    #[tokio::test]
    async fn runnable_calls_are_unsupported() {
        let strategy = SerialThrottlingStrategy::new().unwrap();

        let err = strategy
            .runnable_call(CallContext::new("run", 7), Box::new(Noop))
            .unwrap_err();

        assert!(matches!(
            err,
            ThrottleError::Unsupported {
                strategy: "serial",
                operation: "runnable_call"
            }
        ));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn dropping_the_strategy_stops_the_slot() {
        let recorder = Recorder::new();
        let strategy = SerialThrottlingStrategy::new().unwrap();
        strategy
            .submit(
                call_with(ScriptedInvoker::returning(json!(1))),
                recorder.responder(DeliveryMode::Accept),
            )
            .unwrap();
        recorder.wait_for(1).await;
        let queue = Arc::clone(&strategy.queue);

        drop(strategy);

        // The worker and its supervisor release their handles once they exit.
        tokio::time::timeout(Duration::from_secs(1), async {
            while Arc::strong_count(&queue) > 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert!(queue.is_shut_down());
    }
}
