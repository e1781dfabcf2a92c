use twinbase_core_types::{CorrelationId, RequestContext, RequestId, TraceId};
use thiserror::Error;

/// Result type alias using TwinError
pub type Result<T> = std::result::Result<T, TwinError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure of the tree engine and the invocation engine is classified
/// into one of these kinds. Each kind maps to a stable error code which the
/// boundary layer translates into its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExErrorKind {
    /// Path, handle, handler or parameter absent
    NotFound,
    /// Identity collision on create
    Conflict,
    /// Structural invariant violated or argument shape mismatch
    Validation,
    /// Invocation exceeded its deadline
    Timeout,
    /// Encoding or decoding failure
    Serialization,
    /// Settings could not be loaded
    Config,
    /// Unexpected failure during an otherwise valid operation
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Conflict => "ERR_CONFLICT",
            ExErrorKind::Validation => "ERR_VALIDATION",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification together with optional context (operation,
/// element path, correlation ids) for programmatic handling and debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    path: Option<String>,
    correlation_id: Option<CorrelationId>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            path: None,
            correlation_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add element path context
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add invocation handle context
    pub fn with_correlation_id(mut self, id: CorrelationId) -> Self {
        self.correlation_id = Some(id);
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add the request and trace ids of the request that failed
    pub fn with_context(mut self, ctx: &RequestContext) -> Self {
        self.request_id = Some(ctx.request_id.clone());
        self.trace_id.clone_from(&ctx.trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the element path context, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Get the invocation handle context, if any
    pub fn correlation_id(&self) -> Option<&CorrelationId> {
        self.correlation_id.as_ref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the trace ID context, if any
    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        if let Some(id) = &self.correlation_id {
            write!(f, " (correlation_id: {})", id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for tree and invocation operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TwinError {
    // ===== Not Found =====
    /// No node resolves at the given path
    #[error("Element not found: {path}")]
    ElementNotFound { path: String },

    /// The parent addressed for a create does not resolve
    #[error("Parent element {path} not found")]
    ParentNotFound { path: String },

    /// The element has no bound read/write or method handler
    #[error("Handler for {path} not found")]
    HandlerNotFound { path: String },

    /// The node at the path exists but is not an operation
    #[error("Element {path} is not invocable")]
    NotInvocable { path: String },

    /// No stored invocation result for the handle
    #[error("Request with id {correlation_id} not found for operation {path}")]
    InvocationNotFound {
        path: String,
        correlation_id: String,
    },

    /// A supplied argument names no declared parameter
    #[error("Input variable {parameter} not found")]
    ParameterNotFound { parameter: String },

    // ===== Conflict =====
    /// A collection child with the same IdShort already exists
    #[error("Element with IdShort {id_short} already exists in {parent}")]
    DuplicateIdShort { id_short: String, parent: String },

    // ===== Validation =====
    /// Children of a list must be addressed by position only
    #[error("List element children must not have an IdShort: '{id_short}'")]
    ListChildHasIdShort { id_short: String },

    /// Children of a collection must carry an IdShort
    #[error("IdShort is required for children of {parent}")]
    MissingIdShort { parent: String },

    /// IdShort contains a reserved path character or is empty
    #[error("Invalid IdShort '{id_short}': {reason}")]
    InvalidIdShort { id_short: String, reason: String },

    /// Path string does not follow the segment grammar
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Children cannot be created below a leaf element
    #[error("Element {path} of type {model_type} cannot hold children")]
    NotAContainer { path: String, model_type: String },

    /// The structural root of a container cannot be updated or deleted
    #[error("The container root cannot be {action}")]
    CannotModifyRoot { action: String },

    /// Model type of the request does not match the stored element
    #[error("Model type {actual} does not match expected {expected}")]
    ModelTypeMismatch { expected: String, actual: String },

    /// Value cannot be converted into the declared value type
    #[error("Value {value} of {parameter} cannot be converted to {value_type}")]
    ValueCoercion {
        parameter: String,
        value_type: String,
        value: String,
    },

    /// Pagination cursor could not be decoded or matches no item
    #[error("Invalid cursor: {cursor}")]
    InvalidCursor { cursor: String },

    /// Page size outside the accepted range
    #[error("Invalid page limit {limit}: {reason}")]
    InvalidLimit { limit: usize, reason: String },

    // ===== Timeout =====
    /// Invocation did not finish within its deadline
    #[error("Invocation of {path} timed out after {timeout_ms} ms")]
    InvocationTimeout { path: String, timeout_ms: u64 },

    // ===== Generic Errors =====
    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Settings could not be read or parsed
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl TwinError {
    /// Classify this error into the canonical taxonomy
    pub fn kind(&self) -> ExErrorKind {
        match self {
            TwinError::ElementNotFound { .. }
            | TwinError::ParentNotFound { .. }
            | TwinError::HandlerNotFound { .. }
            | TwinError::NotInvocable { .. }
            | TwinError::InvocationNotFound { .. }
            | TwinError::ParameterNotFound { .. } => ExErrorKind::NotFound,

            TwinError::DuplicateIdShort { .. } => ExErrorKind::Conflict,

            TwinError::ListChildHasIdShort { .. }
            | TwinError::MissingIdShort { .. }
            | TwinError::InvalidIdShort { .. }
            | TwinError::InvalidPath { .. }
            | TwinError::NotAContainer { .. }
            | TwinError::CannotModifyRoot { .. }
            | TwinError::ModelTypeMismatch { .. }
            | TwinError::ValueCoercion { .. }
            | TwinError::InvalidCursor { .. }
            | TwinError::InvalidLimit { .. } => ExErrorKind::Validation,

            TwinError::InvocationTimeout { .. } => ExErrorKind::Timeout,
            TwinError::Serialization { .. } => ExErrorKind::Serialization,
            TwinError::Config { .. } => ExErrorKind::Config,
            TwinError::Internal { .. } => ExErrorKind::Internal,
        }
    }

    /// Element path carried by this error, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            TwinError::ElementNotFound { path }
            | TwinError::ParentNotFound { path }
            | TwinError::HandlerNotFound { path }
            | TwinError::NotInvocable { path }
            | TwinError::InvocationNotFound { path, .. }
            | TwinError::InvalidPath { path, .. }
            | TwinError::NotAContainer { path, .. }
            | TwinError::InvocationTimeout { path, .. } => Some(path),
            TwinError::DuplicateIdShort { parent, .. } => Some(parent),
            _ => None,
        }
    }
}

/// Conversion from TwinError to ExError
///
/// The canonical error keeps the domain message and the element path so the
/// boundary layer can render both without matching on domain variants.
impl From<TwinError> for ExError {
    fn from(err: TwinError) -> Self {
        let mut ex = ExError::new(err.kind()).with_message(err.to_string());
        if let Some(path) = err.path() {
            ex = ex.with_path(path);
        }
        if let TwinError::InvocationNotFound { correlation_id, .. } = err {
            ex = ex.with_correlation_id(CorrelationId::from_string(correlation_id));
        }
        ex
    }
}

impl From<serde_json::Error> for TwinError {
    fn from(err: serde_json::Error) -> Self {
        TwinError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for TwinError {
    fn from(err: toml::de::Error) -> Self {
        TwinError::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
            (ExErrorKind::Conflict, "ERR_CONFLICT"),
            (ExErrorKind::Validation, "ERR_VALIDATION"),
            (ExErrorKind::Timeout, "ERR_TIMEOUT"),
            (ExErrorKind::Internal, "ERR_INTERNAL"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_handler_not_found_is_distinct_but_same_kind() {
        let missing = TwinError::ElementNotFound {
            path: "Ops.Calculate".to_string(),
        };
        let unbound = TwinError::HandlerNotFound {
            path: "Ops.Calculate".to_string(),
        };
        assert_ne!(missing, unbound);
        assert_eq!(missing.kind(), unbound.kind());
    }

    #[test]
    fn test_ex_error_display_contains_code_and_path() {
        let ex: ExError = TwinError::DuplicateIdShort {
            id_short: "Temp".to_string(),
            parent: "Measurements".to_string(),
        }
        .into();
        let rendered = ex.to_string();
        assert!(rendered.starts_with("[ERR_CONFLICT]"));
        assert!(rendered.contains("(path: Measurements)"));
    }
}
