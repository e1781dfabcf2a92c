#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::*;
use std::sync::Arc;
use tracing::Level;
use twinbase_core::logging_facility::test_capture::init_test_capture;
use twinbase_core_types::schema::{EVENT_END, EVENT_START, FIELD_CORRELATION_ID, FIELD_TIMEOUT_MS};
use twinbase_invocation::{InvocationEngine, InvocationRequest};

// One test per binary: the capture layer is global and the engine logs
// under fixed op names.
#[tokio::test]
async fn test_invocation_logs_start_end_and_timeout_warning() {
    let capture = init_test_capture();
    let engine = InvocationEngine::default();

    // GIVEN a completing and a stuck invocation
    let ok = machine_with(Arc::new(CalculateHandler));
    let request = InvocationRequest::new("log-ok").with_input(expression("2*3"));
    engine
        .invoke(engine.prepare(&ok, "Machine.Calculate", request).unwrap())
        .await;

    let stuck = machine_with(Arc::new(PendingHandler));
    let request = InvocationRequest::new("log-stuck").with_timeout_ms(20);
    engine
        .invoke(engine.prepare(&stuck, "Machine.Calculate", request).unwrap())
        .await;

    // THEN both bracket with start/end
    let events = capture.events_for_op("invoke_operation");
    let starts = events
        .iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_START))
        .count();
    let ends = events
        .iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END))
        .count();
    assert_eq!(starts, 2);
    assert_eq!(ends, 2);

    // AND the timeout is logged at warn
    let warnings = capture.count_events(|e| {
        e.level == Level::WARN
            && e.fields.get(FIELD_CORRELATION_ID).map(String::as_str) == Some("log-stuck")
            && e.fields.get(FIELD_TIMEOUT_MS).map(String::as_str) == Some("20")
    });
    assert_eq!(warnings, 1);
}
