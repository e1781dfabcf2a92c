use twinbase_core::errors::{ExError, ExErrorKind, TwinError};
use twinbase_core_types::{CorrelationId, RequestContext, TraceId};

#[test]
fn test_not_found_verifiable_by_kind() {
    let err = TwinError::ElementNotFound {
        path: "Measurements.Temp".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
    assert_eq!(ex_err.code(), "ERR_NOT_FOUND");
    assert_eq!(ex_err.path(), Some("Measurements.Temp"));
}

#[test]
fn test_conflict_distinct_from_validation() {
    let conflict: ExError = TwinError::DuplicateIdShort {
        id_short: "Temp".to_string(),
        parent: "Measurements".to_string(),
    }
    .into();
    let validation: ExError = TwinError::ListChildHasIdShort {
        id_short: "Temp".to_string(),
    }
    .into();

    assert_eq!(conflict.code(), "ERR_CONFLICT");
    assert_eq!(validation.code(), "ERR_VALIDATION");
}

#[test]
fn test_invocation_not_found_carries_handle() {
    let ex_err: ExError = TwinError::InvocationNotFound {
        path: "Calculate".to_string(),
        correlation_id: "req-7".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
    assert_eq!(ex_err.correlation_id(), Some(&CorrelationId::from("req-7")));
    assert!(ex_err.to_string().contains("(correlation_id: req-7)"));
}

#[test]
fn test_timeout_kind() {
    let err = TwinError::InvocationTimeout {
        path: "Calculate".to_string(),
        timeout_ms: 100,
    };
    assert_eq!(err.kind(), ExErrorKind::Timeout);
    assert_eq!(err.kind().code(), "ERR_TIMEOUT");
}

#[test]
fn test_validation_family() {
    let errors = vec![
        TwinError::MissingIdShort {
            parent: "M".to_string(),
        },
        TwinError::InvalidPath {
            path: "a..b".to_string(),
            reason: "empty segment".to_string(),
        },
        TwinError::CannotModifyRoot {
            action: "deleted".to_string(),
        },
        TwinError::ValueCoercion {
            parameter: "Expression".to_string(),
            value_type: "xs:int".to_string(),
            value: "\"abc\"".to_string(),
        },
        TwinError::InvalidLimit {
            limit: 0,
            reason: "must be at least 1".to_string(),
        },
    ];

    for err in errors {
        assert_eq!(err.kind(), ExErrorKind::Validation, "{:?}", err);
    }
}

#[test]
fn test_builder_context() {
    let ex_err = ExError::new(ExErrorKind::Internal)
        .with_op("invoke_operation")
        .with_message("handler panicked");

    assert_eq!(ex_err.op(), Some("invoke_operation"));
    assert_eq!(
        ex_err.to_string(),
        "[ERR_INTERNAL] in operation 'invoke_operation': handler panicked"
    );
}

#[test]
fn test_request_context_attaches_ids() {
    let trace_id = TraceId::from("trace-1");
    let ctx = RequestContext::new().with_trace_id(trace_id.clone());

    let ex_err: ExError = ExError::from(TwinError::ParentNotFound {
        path: "Machine".to_string(),
    })
    .with_op("create_element")
    .with_context(&ctx);

    assert_eq!(ex_err.request_id(), Some(&ctx.request_id));
    assert_eq!(ex_err.trace_id(), Some(&trace_id));
    assert_eq!(ex_err.op(), Some("create_element"));
}
