//! Capabilities injected by the binding layer
//!
//! The engine calls these handlers but knows nothing about their
//! implementation. A `ValueHandler` backs the value of a leaf element; a
//! `MethodHandler` executes an operation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::element::Element;
use crate::errors::Result;

/// Read/write capability for the value of a single element
pub trait ValueHandler: Send + Sync {
    /// # Errors
    /// Implementation defined; surfaced unchanged to the caller.
    fn get(&self, element: &Element) -> Result<Value>;

    /// # Errors
    /// Implementation defined; surfaced unchanged to the caller.
    fn set(&self, element: &Element, value: Value) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum MessageType {
    Info,
    Warning,
    Error,
    Exception,
    Timeout,
}

/// Diagnostic attached to an invocation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_type: MessageType,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(message_type: MessageType, text: impl Into<String>) -> Self {
        Self {
            message_type,
            text: text.into(),
            code: None,
            timestamp: Utc::now(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(MessageType::Info, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageType::Error, text)
    }

    pub fn exception(text: impl Into<String>) -> Self {
        Self::new(MessageType::Exception, text)
    }

    pub fn timeout(text: impl Into<String>) -> Self {
        Self::new(MessageType::Timeout, text)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Outcome reported by a method handler
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    pub success: bool,
    pub messages: Vec<Message>,
}

impl OperationResult {
    pub fn success() -> Self {
        Self {
            success: true,
            messages: Vec::new(),
        }
    }

    pub fn failure(message: Message) -> Self {
        Self {
            success: false,
            messages: vec![message],
        }
    }
}

/// Arguments handed to a method handler
///
/// `output_arguments` starts as a skeleton of the declared outputs; the
/// handler fills in values and may modify `in_output_arguments`.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub operation: Element,
    pub input_arguments: Vec<Element>,
    pub in_output_arguments: Vec<Element>,
    pub output_arguments: Vec<Element>,
}

impl MethodCall {
    /// Declared input variables of the operation
    pub fn declared_inputs(&self) -> &[Element] {
        match &self.operation.kind {
            super::element::ElementKind::Operation {
                input_variables, ..
            } => input_variables.as_slice(),
            _ => &[],
        }
    }

    pub fn input(&self, id_short: &str) -> Option<&Element> {
        self.input_arguments
            .iter()
            .find(|e| e.id_short() == Some(id_short))
    }

    pub fn input_value(&self, id_short: &str) -> Option<Value> {
        self.input(id_short).and_then(Element::value)
    }

    /// Set the value of a declared output
    ///
    /// # Errors
    /// * `ParameterNotFound` - If no output with that IdShort was declared
    /// * `ValueCoercion` - If the value does not fit the declared type
    pub fn set_output(&mut self, id_short: &str, value: Value) -> Result<()> {
        let output = self
            .output_arguments
            .iter_mut()
            .find(|e| e.id_short() == Some(id_short))
            .ok_or_else(|| crate::errors::TwinError::ParameterNotFound {
                parameter: id_short.to_string(),
            })?;
        output.set_value(value)
    }
}

/// Executes an operation
///
/// `cancel` fires when the invocation deadline passes. Cancellation is
/// cooperative: a handler that ignores it keeps running.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    async fn invoke(&self, call: &mut MethodCall, cancel: CancellationToken) -> OperationResult;
}

/// Shared handle to a `ValueHandler`; equal only to itself
#[derive(Clone)]
pub struct ValueHandlerRef(Arc<dyn ValueHandler>);

impl ValueHandlerRef {
    pub fn new(handler: Arc<dyn ValueHandler>) -> Self {
        Self(handler)
    }
}

impl std::ops::Deref for ValueHandlerRef {
    type Target = dyn ValueHandler;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl std::fmt::Debug for ValueHandlerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ValueHandler")
    }
}

impl PartialEq for ValueHandlerRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Shared handle to a `MethodHandler`; equal only to itself
#[derive(Clone)]
pub struct MethodHandlerRef(Arc<dyn MethodHandler>);

impl MethodHandlerRef {
    pub fn new(handler: Arc<dyn MethodHandler>) -> Self {
        Self(handler)
    }

    /// Owned handle, for moving into a spawned task
    pub fn shared(&self) -> Arc<dyn MethodHandler> {
        Arc::clone(&self.0)
    }
}

impl std::fmt::Debug for MethodHandlerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MethodHandler")
    }
}

impl PartialEq for MethodHandlerRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
