use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use twinbase_core::model::{DataType, Element, Message, MethodCall, MethodHandler, OperationResult};
use twinbase_core::ElementContainer;
use twinbase_core_types::CorrelationId;
use twinbase_invocation::{ExecutionState, InvocationEngine, InvocationResponse};

/// Multiplies the two factors of an `Expression` such as "3*8"
pub struct CalculateHandler;

#[async_trait]
impl MethodHandler for CalculateHandler {
    async fn invoke(&self, call: &mut MethodCall, _cancel: CancellationToken) -> OperationResult {
        let expression = call
            .input_value("Expression")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let product: Option<i64> = expression
            .split('*')
            .map(|f| f.trim().parse::<i64>().ok())
            .try_fold(1i64, |acc, f| f.map(|f| acc * f));
        match product {
            Some(product) => match call.set_output("Result", json!(product)) {
                Ok(()) => OperationResult::success(),
                Err(e) => OperationResult::failure(Message::error(e.to_string())),
            },
            None => OperationResult::failure(Message::error(format!(
                "cannot evaluate {}",
                expression
            ))),
        }
    }
}

/// Doubles the integer input `Value`
pub struct DoubleHandler;

#[async_trait]
impl MethodHandler for DoubleHandler {
    async fn invoke(&self, call: &mut MethodCall, _cancel: CancellationToken) -> OperationResult {
        let value = call.input_value("Value").and_then(|v| v.as_i64()).unwrap_or(0);
        match call.set_output("Result", json!(value * 2)) {
            Ok(()) => OperationResult::success(),
            Err(e) => OperationResult::failure(Message::error(e.to_string())),
        }
    }
}

/// Never returns
pub struct PendingHandler;

#[async_trait]
impl MethodHandler for PendingHandler {
    async fn invoke(&self, _call: &mut MethodCall, _cancel: CancellationToken) -> OperationResult {
        std::future::pending::<()>().await;
        OperationResult::success()
    }
}

/// Reports failure without touching outputs
pub struct FailingHandler;

#[async_trait]
impl MethodHandler for FailingHandler {
    async fn invoke(&self, _call: &mut MethodCall, _cancel: CancellationToken) -> OperationResult {
        OperationResult::failure(Message::error("device offline").with_code("E42"))
    }
}

pub struct PanickingHandler;

#[async_trait]
impl MethodHandler for PanickingHandler {
    async fn invoke(&self, _call: &mut MethodCall, _cancel: CancellationToken) -> OperationResult {
        panic!("handler bug");
    }
}

/// Sleeps, ignoring cancellation, then sets `Result` to 24
pub struct SlowHandler {
    pub delay: Duration,
}

#[async_trait]
impl MethodHandler for SlowHandler {
    async fn invoke(&self, call: &mut MethodCall, _cancel: CancellationToken) -> OperationResult {
        tokio::time::sleep(self.delay).await;
        match call.set_output("Result", json!(24)) {
            Ok(()) => OperationResult::success(),
            Err(e) => OperationResult::failure(Message::error(e.to_string())),
        }
    }
}

/// Waits for cancellation and reports it on a channel
pub struct CancelObservingHandler {
    pub observed: mpsc::UnboundedSender<()>,
}

#[async_trait]
impl MethodHandler for CancelObservingHandler {
    async fn invoke(&self, _call: &mut MethodCall, cancel: CancellationToken) -> OperationResult {
        cancel.cancelled().await;
        let _ = self.observed.send(());
        OperationResult::failure(Message::info("cancelled"))
    }
}

/// Operation `Calculate(Expression: string) -> Result: int`
#[allow(dead_code)]
pub fn calculate_operation(handler: Arc<dyn MethodHandler>) -> Element {
    Element::operation(
        "Calculate",
        vec![Element::property("Expression", DataType::String, json!(null))],
        vec![Element::property("Result", DataType::Int, json!(null))],
    )
    .with_method(handler)
}

/// Container with `Calculate` under collection `Machine`
#[allow(dead_code)]
pub fn machine_with(handler: Arc<dyn MethodHandler>) -> ElementContainer {
    let mut container = ElementContainer::new(None);
    container.create(Element::collection("Machine")).unwrap();
    container
        .create_at("Machine", calculate_operation(handler))
        .unwrap();
    container
}

/// Container with `Double(Value: int) -> Result: int` at the top level
#[allow(dead_code)]
pub fn doubler() -> ElementContainer {
    let mut container = ElementContainer::new(None);
    container
        .create(
            Element::operation(
                "Double",
                vec![Element::property("Value", DataType::Int, json!(null))],
                vec![Element::property("Result", DataType::Int, json!(null))],
            )
            .with_method(Arc::new(DoubleHandler)),
        )
        .unwrap();
    container
}

#[allow(dead_code)]
pub fn expression(text: &str) -> Element {
    Element::property("Expression", DataType::String, json!(text))
}

/// Poll until a terminal state is stored, or give up after `within`
#[allow(dead_code)]
pub async fn poll_terminal(
    engine: &InvocationEngine,
    path: &str,
    request_id: &CorrelationId,
    within: Duration,
) -> InvocationResponse {
    let deadline = tokio::time::Instant::now() + within;
    loop {
        let response = engine.get_invocation_result(path, request_id).unwrap();
        if response.execution_state.is_terminal() || tokio::time::Instant::now() >= deadline {
            return response;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Poll until `state` is stored, or give up after `within`
#[allow(dead_code)]
pub async fn poll_state(
    engine: &InvocationEngine,
    path: &str,
    request_id: &CorrelationId,
    state: ExecutionState,
    within: Duration,
) -> InvocationResponse {
    let deadline = tokio::time::Instant::now() + within;
    loop {
        let response = engine.get_invocation_result(path, request_id).unwrap();
        if response.execution_state == state || tokio::time::Instant::now() >= deadline {
            return response;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
