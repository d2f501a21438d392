use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use throttle_core::domain::{CallContext, CallError, ServiceCall, ServiceInterface};
use throttle_core::impls::{MethodHandler, MethodTable, OneshotResponder};
use throttle_core::{ThrottleConfig, strategy};

struct Calculator;

impl ServiceInterface for Calculator {
    fn service_name(&self) -> &str {
        "Calculator"
    }
}

#[derive(Debug, Deserialize)]
struct DivideArgs {
    numerator: i64,
    denominator: i64,
}

/// Slow on purpose so the queue visibly serializes calls.
struct Divide;

#[async_trait]
impl MethodHandler for Divide {
    async fn call(
        &self,
        _service: &dyn ServiceInterface,
        _context: &CallContext,
        args: &[Value],
    ) -> Result<Value, CallError> {
        let raw = args.first().cloned().unwrap_or(Value::Null);
        let p: DivideArgs = serde_json::from_value(raw)
            .map_err(|e| CallError::user("ApiUsageException", format!("json decode: {e}")))?;

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        divide(&p)
    }
}

fn divide(p: &DivideArgs) -> Result<Value, CallError> {
    match p.numerator.checked_div(p.denominator) {
        Some(quotient) => Ok(json!(quotient)),
        None if p.denominator == 0 => {
            Err(CallError::user("ValidationException", "division by zero"))
        }
        None => Err(CallError::user("ValidationException", "quotient overflows i64")),
    }
}

fn init_logging() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging()?;

    // Optional JSON config as the first argument, e.g. '{"slot_name":"demo"}'.
    let config = match std::env::args().nth(1) {
        Some(raw) => ThrottleConfig::from_json(&raw)?,
        None => ThrottleConfig::default(),
    };

    let mut table = MethodTable::new();
    table.register("divide", Arc::new(Divide))?;
    table.register_fn("add", |args| {
        Ok(json!(args.iter().filter_map(Value::as_i64).sum::<i64>()))
    })?;
    table.register_void_fn("log", |args| {
        info!(?args, "log called");
        Ok(Value::Null)
    })?;
    let invoker = Arc::new(table);
    let service = Arc::new(Calculator);

    let throttle = strategy::build(&config)?;
    info!(strategy = %config.strategy, slot = %config.slot_name, "throttling strategy ready");

    let calls = vec![
        ("add", vec![json!(40), json!(2)]),
        ("divide", vec![json!({ "numerator": 84, "denominator": 2 })]),
        ("divide", vec![json!({ "numerator": 1, "denominator": 0 })]),
        ("divide", vec![json!({ "numerator": i64::MIN, "denominator": -1 })]),
        ("log", vec![json!("hello")]),
        ("missing", vec![]),
    ];

    let mut pending = Vec::new();
    for (request_id, (operation, args)) in (1..).zip(calls) {
        let (responder, rx) = OneshotResponder::channel();
        let call = ServiceCall::new(
            service.clone(),
            invoker.clone(),
            CallContext::new(operation, request_id),
            args,
        );
        let admission = throttle.service_call(call, Box::new(responder))?;
        println!("submitted #{request_id} {operation}: {admission:?}");
        pending.push((request_id, operation, rx));
    }

    for (request_id, operation, rx) in pending {
        match rx.await {
            Ok(Ok(Some(value))) => println!("#{request_id} {operation} -> {value}"),
            Ok(Ok(None)) => println!("#{request_id} {operation} -> (void)"),
            Ok(Err(err)) => println!("#{request_id} {operation} failed: {err}"),
            Err(_) => println!("#{request_id} {operation} was never completed"),
        }
    }

    throttle.shutdown()?;

    // Rejected inline once the queue is shut down.
    let (responder, rx) = OneshotResponder::channel();
    let late = ServiceCall::new(service, invoker, CallContext::new("add", 99), vec![json!(1)]);
    let admission = throttle.service_call(late, Box::new(responder))?;
    println!("late submission: {admission:?} -> {:?}", rx.await?);

    throttle.join().await?;
    Ok(())
}
