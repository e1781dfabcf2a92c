use serde::{Deserialize, Serialize};
use twinbase_core::model::{Element, Message};
use twinbase_core_types::CorrelationId;

/// Progress of one invocation
///
/// `Initiated -> Running -> {Completed | Failed | Timeout}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionState {
    Initiated,
    Running,
    Completed,
    Failed,
    Timeout,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Completed | ExecutionState::Failed | ExecutionState::Timeout
        )
    }
}

/// Arguments of one invocation
///
/// `timeout` overrides the engine default, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationRequest {
    pub request_id: CorrelationId,
    #[serde(default)]
    pub input_arguments: Vec<Element>,
    #[serde(default)]
    pub in_output_arguments: Vec<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl InvocationRequest {
    pub fn new(request_id: impl Into<CorrelationId>) -> Self {
        Self {
            request_id: request_id.into(),
            input_arguments: Vec::new(),
            in_output_arguments: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_input(mut self, argument: Element) -> Self {
        self.input_arguments.push(argument);
        self
    }

    pub fn with_in_output(mut self, argument: Element) -> Self {
        self.in_output_arguments.push(argument);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }
}

/// Outcome, or latest known state, of one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub request_id: CorrelationId,
    pub success: bool,
    pub execution_state: ExecutionState,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub output_arguments: Vec<Element>,
    #[serde(default)]
    pub in_output_arguments: Vec<Element>,
}

impl InvocationResponse {
    pub(crate) fn with_state(
        request_id: CorrelationId,
        execution_state: ExecutionState,
        output_arguments: Vec<Element>,
        in_output_arguments: Vec<Element>,
    ) -> Self {
        Self {
            request_id,
            success: false,
            execution_state,
            messages: Vec::new(),
            output_arguments,
            in_output_arguments,
        }
    }

    /// Output argument by IdShort
    pub fn output(&self, id_short: &str) -> Option<&Element> {
        self.output_arguments
            .iter()
            .find(|e| e.id_short() == Some(id_short))
    }
}
