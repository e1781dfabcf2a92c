//! Invocation engine
//!
//! A run spawns the method handler onto the runtime and races it against a
//! deadline. The handler owns its `MethodCall` for the duration of the run
//! and hands it back on completion, so outputs are only ever read from a
//! finished handler. When the deadline wins, the handler is signalled
//! through its `CancellationToken` and left running; what happens to its
//! eventual result is governed by `LateCompletion`.

use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use twinbase_core::container::ElementContainer;
use twinbase_core::model::{
    Element, ElementKind, Message, MethodCall, MethodHandler, OperationResult,
};
use twinbase_core::{log_op_end, log_op_error, log_op_start, Result, TwinError};
use twinbase_core_types::CorrelationId;

use crate::request::{ExecutionState, InvocationRequest, InvocationResponse};
use crate::store::InvocationResultStore;
use crate::validation::{output_skeleton, validate_input_arguments};

/// Deadline applied when a request carries no timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// What to do with a handler result that arrives after the deadline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LateCompletion {
    /// Store the late result over the `Timeout` response
    #[default]
    Overwrite,
    /// Keep the `Timeout` response
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationSettings {
    pub default_timeout: Duration,
    pub late_completion: LateCompletion,
}

impl Default for InvocationSettings {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            late_completion: LateCompletion::default(),
        }
    }
}

type HandlerOutcome = (MethodCall, OperationResult);

/// A validated invocation, detached from the container it came from
pub struct PreparedInvocation {
    path: String,
    request_id: CorrelationId,
    timeout: Duration,
    handler: Arc<dyn MethodHandler>,
    call: MethodCall,
}

impl PreparedInvocation {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn request_id(&self) -> &CorrelationId {
        &self.request_id
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for PreparedInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedInvocation")
            .field("path", &self.path)
            .field("request_id", &self.request_id)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Response for the deadline branch, built before the handler starts
struct TimeoutFallback {
    output_arguments: Vec<Element>,
    in_output_arguments: Vec<Element>,
}

#[derive(Debug, Clone, Default)]
pub struct InvocationEngine {
    store: Arc<InvocationResultStore>,
    settings: InvocationSettings,
}

impl InvocationEngine {
    pub fn new(settings: InvocationSettings) -> Self {
        Self {
            store: Arc::new(InvocationResultStore::new()),
            settings,
        }
    }

    pub fn settings(&self) -> &InvocationSettings {
        &self.settings
    }

    /// Resolve and validate an invocation of the operation at `path`
    ///
    /// Only reads the container; the returned invocation owns everything
    /// it needs, so callers may release their lock on the model before
    /// running it.
    ///
    /// # Errors
    /// * `ElementNotFound` - If nothing resolves at `path`
    /// * `NotInvocable` - If the element is not an operation
    /// * `HandlerNotFound` - If the operation has no method handler
    /// * `ParameterNotFound` / `ModelTypeMismatch` / `ValueCoercion` - If
    ///   the input arguments do not match the declared inputs
    pub fn prepare(
        &self,
        container: &ElementContainer,
        path: &str,
        request: InvocationRequest,
    ) -> Result<PreparedInvocation> {
        let operation = container.retrieve(path)?;
        let ElementKind::Operation {
            input_variables,
            output_variables,
            method,
            ..
        } = &operation.kind
        else {
            return Err(TwinError::NotInvocable {
                path: path.to_string(),
            });
        };
        let handler = method
            .as_ref()
            .ok_or_else(|| TwinError::HandlerNotFound {
                path: path.to_string(),
            })?
            .shared();

        let input_arguments = validate_input_arguments(input_variables, &request.input_arguments)?;
        let timeout = request
            .timeout
            .map(Duration::from_millis)
            .unwrap_or(self.settings.default_timeout);

        Ok(PreparedInvocation {
            path: path.to_string(),
            request_id: request.request_id,
            timeout,
            handler,
            call: MethodCall {
                operation: operation.clone(),
                input_arguments,
                in_output_arguments: request.in_output_arguments,
                output_arguments: output_skeleton(output_variables),
            },
        })
    }

    /// Run an invocation and wait for its terminal state
    ///
    /// Returns no later than the effective timeout. A handler still running
    /// at that point keeps running detached; its result is dropped.
    pub async fn invoke(&self, prepared: PreparedInvocation) -> InvocationResponse {
        log_op_start!(
            "invoke_operation",
            path = %prepared.path,
            correlation_id = %prepared.request_id,
            mode = "sync"
        );
        let start = Instant::now();
        let path = prepared.path.clone();

        let (response, _late) = run(prepared).await;

        log_op_end!(
            "invoke_operation",
            duration_ms = start.elapsed().as_millis() as u64,
            path = %path,
            state = ?response.execution_state
        );
        response
    }

    /// Start an invocation in the background and return `Initiated`
    ///
    /// The result store holds an `Initiated` placeholder straight away,
    /// `Running` once the background task starts, then the terminal
    /// response. Poll it with [`InvocationEngine::get_invocation_result`].
    pub async fn invoke_async(&self, prepared: PreparedInvocation) -> InvocationResponse {
        log_op_start!(
            "invoke_operation",
            path = %prepared.path,
            correlation_id = %prepared.request_id,
            mode = "async"
        );
        let start = Instant::now();

        let placeholder = InvocationResponse::with_state(
            prepared.request_id.clone(),
            ExecutionState::Initiated,
            prepared.call.output_arguments.clone(),
            prepared.call.in_output_arguments.clone(),
        );
        self.store.store(&prepared.path, placeholder.clone());

        let path = prepared.path.clone();
        let request_id = prepared.request_id.clone();
        let store = Arc::clone(&self.store);
        let late_completion = self.settings.late_completion;
        tokio::spawn(async move {
            let mut running = placeholder.clone();
            running.execution_state = ExecutionState::Running;
            store.store(&prepared.path, running);

            let path = prepared.path.clone();
            let (response, late) = run(prepared).await;
            store.store(&path, response);

            if let Some(late) = late {
                settle_late(&store, &path, placeholder, late, late_completion).await;
            }
        });

        log_op_end!(
            "invoke_operation",
            duration_ms = start.elapsed().as_millis() as u64,
            path = %path,
            state = ?ExecutionState::Initiated
        );
        let mut initiated =
            InvocationResponse::with_state(request_id, ExecutionState::Initiated, Vec::new(), Vec::new());
        initiated.success = true;
        initiated
    }

    /// Latest stored response for an asynchronous invocation
    ///
    /// # Errors
    /// * `InvocationNotFound` - If nothing was stored under the handle
    pub fn get_invocation_result(
        &self,
        path: &str,
        request_id: &CorrelationId,
    ) -> Result<InvocationResponse> {
        let start = Instant::now();
        self.store.lookup(path, request_id).ok_or_else(|| {
            let err = TwinError::InvocationNotFound {
                path: path.to_string(),
                correlation_id: request_id.to_string(),
            };
            log_op_error!(
                "get_invocation_result",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            err
        })
    }
}

/// Race the handler against the deadline
///
/// On timeout the still-running handler's join handle is returned so the
/// caller can decide what to do with its eventual result.
async fn run(prepared: PreparedInvocation) -> (InvocationResponse, Option<JoinHandle<HandlerOutcome>>) {
    let PreparedInvocation {
        path,
        request_id,
        timeout,
        handler,
        mut call,
    } = prepared;

    let fallback = TimeoutFallback {
        output_arguments: call.output_arguments.clone(),
        in_output_arguments: call.in_output_arguments.clone(),
    };
    let cancel = CancellationToken::new();
    let handler_cancel = cancel.clone();
    let mut task = tokio::spawn(async move {
        let result = handler.invoke(&mut call, handler_cancel).await;
        (call, result)
    });

    tokio::select! {
        joined = &mut task => (completion(request_id, joined, fallback), None),
        _ = tokio::time::sleep(timeout) => {
            cancel.cancel();
            let timeout_ms = timeout.as_millis() as u64;
            warn!(path = %path, correlation_id = %request_id, timeout_ms, "operation timed out");
            let mut response = InvocationResponse::with_state(
                request_id,
                ExecutionState::Timeout,
                fallback.output_arguments,
                fallback.in_output_arguments,
            );
            response.messages.push(Message::timeout(format!(
                "Operation {} did not complete within {} ms",
                path, timeout_ms
            )));
            (response, Some(task))
        }
    }
}

fn completion(
    request_id: CorrelationId,
    joined: std::result::Result<HandlerOutcome, JoinError>,
    fallback: TimeoutFallback,
) -> InvocationResponse {
    match joined {
        Ok((call, result)) => {
            let state = if result.success {
                ExecutionState::Completed
            } else {
                ExecutionState::Failed
            };
            let mut response = InvocationResponse::with_state(
                request_id,
                state,
                call.output_arguments,
                call.in_output_arguments,
            );
            response.success = result.success;
            response.messages = result.messages;
            response
        }
        Err(err) => {
            let mut response = InvocationResponse::with_state(
                request_id,
                ExecutionState::Failed,
                fallback.output_arguments,
                fallback.in_output_arguments,
            );
            response
                .messages
                .push(Message::exception(format!("Method handler aborted: {}", err)));
            response
        }
    }
}

async fn settle_late(
    store: &InvocationResultStore,
    path: &str,
    placeholder: InvocationResponse,
    late: JoinHandle<HandlerOutcome>,
    policy: LateCompletion,
) {
    let fallback = TimeoutFallback {
        output_arguments: placeholder.output_arguments,
        in_output_arguments: placeholder.in_output_arguments,
    };
    let response = completion(placeholder.request_id, late.await, fallback);
    match policy {
        LateCompletion::Overwrite => {
            warn!(
                path = %path,
                correlation_id = %response.request_id,
                state = ?response.execution_state,
                "late completion overwrote timeout result"
            );
            store.store(path, response);
        }
        LateCompletion::Discard => {
            debug!(
                path = %path,
                correlation_id = %response.request_id,
                "late completion discarded"
            );
        }
    }
}
