use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use twinbase_core::model::{
    DataType, Element, Message, MethodCall, MethodHandler, ModelType, OperationResult,
    ValueHandler,
};
use twinbase_core::{Result, Submodel};
use twinbase_engine::SubmodelService;

/// Multiplies the factors of `Expression`, e.g. "3*8"
pub struct CalculateHandler;

#[async_trait]
impl MethodHandler for CalculateHandler {
    async fn invoke(&self, call: &mut MethodCall, _cancel: CancellationToken) -> OperationResult {
        let expression = call
            .input_value("Expression")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let product = expression
            .split('*')
            .map(|f| f.trim().parse::<i64>().ok())
            .try_fold(1i64, |acc, f| f.map(|f| acc * f));
        match product.map(|p| call.set_output("Result", json!(p))) {
            Some(Ok(())) => OperationResult::success(),
            _ => OperationResult::failure(Message::error(format!("cannot evaluate {}", expression))),
        }
    }
}

/// Live counter standing in for a device register
#[derive(Default)]
pub struct Register {
    pub value: AtomicI64,
}

impl ValueHandler for Register {
    fn get(&self, _element: &Element) -> Result<Value> {
        Ok(json!(self.value.load(Ordering::SeqCst)))
    }

    fn set(&self, element: &Element, value: Value) -> Result<()> {
        let value = DataType::Long.coerce(element.id_short().unwrap_or_default(), &value)?;
        self.value
            .store(value.as_i64().unwrap_or_default(), Ordering::SeqCst);
        Ok(())
    }
}

/// Submodel `Telemetry`:
/// `Measurements { Temp = 21.5 }`, `Readings [10, 20, 30]`, `Calculate`
#[allow(dead_code)]
pub fn telemetry() -> Submodel {
    let mut submodel = Submodel::new("Telemetry", "urn:sm:telemetry");
    let elements = &mut submodel.submodel_elements;
    elements.create(Element::collection("Measurements")).unwrap();
    elements
        .create_at(
            "Measurements",
            Element::property("Temp", DataType::Double, json!(21.5)),
        )
        .unwrap();
    elements
        .create(Element::list("Readings", ModelType::Property))
        .unwrap();
    for v in [10, 20, 30] {
        elements
            .create_at("Readings", Element::list_item(DataType::Int, json!(v)))
            .unwrap();
    }
    elements
        .create(
            Element::operation(
                "Calculate",
                vec![Element::property("Expression", DataType::String, json!(null))],
                vec![Element::property("Result", DataType::Int, json!(null))],
            )
            .with_method(Arc::new(CalculateHandler)),
        )
        .unwrap();
    submodel
}

#[allow(dead_code)]
pub fn telemetry_service() -> SubmodelService {
    SubmodelService::new(telemetry())
}
