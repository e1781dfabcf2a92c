//! In-memory event capture for log assertions
//!
//! One capture layer is installed globally per test binary. Tests share it,
//! so assertions filter by an op name, path or correlation id that is unique
//! to the test.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;
use twinbase_core_types::schema::{
    FIELD_COMPONENT, FIELD_CORRELATION_ID, FIELD_ERR_CODE, FIELD_EVENT, FIELD_OP, FIELD_PATH,
    FIELD_STATE,
};

/// One recorded event
///
/// The fields the engine logs with are lifted out; everything else, those
/// included, stays in `fields` rendered as text.
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub component: Option<String>,
    pub op: Option<String>,
    pub event: Option<String>,
    pub path: Option<String>,
    pub correlation_id: Option<String>,
    pub state: Option<String>,
    pub err_code: Option<String>,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn from_event(event: &Event<'_>) -> Self {
        let mut fields = Fields::default();
        event.record(&mut fields);
        let fields = fields.0;
        let lift = |key: &str| fields.get(key).cloned();

        Self {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            component: lift(FIELD_COMPONENT),
            op: lift(FIELD_OP),
            event: lift(FIELD_EVENT),
            path: lift(FIELD_PATH),
            correlation_id: lift(FIELD_CORRELATION_ID),
            state: lift(FIELD_STATE),
            err_code: lift(FIELD_ERR_CODE),
            fields,
        }
    }

    /// Whether this is the `event` phase of `op`
    pub fn is(&self, op: &str, event: &str) -> bool {
        self.op.as_deref() == Some(op) && self.event.as_deref() == Some(event)
    }
}

#[derive(Default)]
struct Fields(HashMap<String, String>);

impl Fields {
    fn put(&mut self, field: &Field, value: String) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl Visit for Fields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.to_string());
    }

    // `%value` fields arrive here and render through Display
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{:?}", value));
    }
}

type Sink = Arc<Mutex<Vec<CapturedEvent>>>;

/// Layer that appends every event to a shared sink
pub struct TestCaptureLayer {
    sink: Sink,
}

impl TestCaptureLayer {
    pub fn new() -> (Self, TestCapture) {
        let sink = Sink::default();
        (Self { sink: sink.clone() }, TestCapture { sink })
    }
}

impl<S: Subscriber> Layer<S> for TestCaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let captured = CapturedEvent::from_event(event);
        if let Ok(mut sink) = self.sink.lock() {
            sink.push(captured);
        }
    }
}

/// Read side of the capture layer
#[derive(Clone)]
pub struct TestCapture {
    sink: Sink,
}

impl TestCapture {
    /// Snapshot of everything recorded so far
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.sink.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn events_for_op(&self, op: &str) -> Vec<CapturedEvent> {
        self.matching(|e| e.op.as_deref() == Some(op))
    }

    pub fn events_for_path(&self, path: &str) -> Vec<CapturedEvent> {
        self.matching(|e| e.path.as_deref() == Some(path))
    }

    /// Events logged for one invocation handle
    pub fn events_for_invocation(&self, correlation_id: &str) -> Vec<CapturedEvent> {
        self.matching(|e| e.correlation_id.as_deref() == Some(correlation_id))
    }

    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().iter().filter(|e| predicate(e)).count()
    }

    /// # Panics
    /// If no `event` phase of `op` was recorded
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let events = self.events();
        assert!(
            events.iter().any(|e| e.is(op, event)),
            "Expected event op={} event={} among {} captured events",
            op,
            event,
            events.len()
        );
    }

    pub fn clear(&self) {
        if let Ok(mut sink) = self.sink.lock() {
            sink.clear();
        }
    }

    fn matching(&self, predicate: impl Fn(&CapturedEvent) -> bool) -> Vec<CapturedEvent> {
        self.events().into_iter().filter(|e| predicate(e)).collect()
    }
}

static GLOBAL_CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture layer on first use and hand out the shared reader
///
/// If another subscriber won the race to become global, the capture stays
/// empty rather than panicking.
///
/// ```
/// use twinbase_core::logging_facility::test_capture::init_test_capture;
/// use twinbase_core::log_op_start;
///
/// let capture = init_test_capture();
/// log_op_start!("retrieve_element", path = "Measurements.Temp");
/// assert_eq!(capture.events_for_path("Measurements.Temp").len(), 1);
/// ```
pub fn init_test_capture() -> TestCapture {
    GLOBAL_CAPTURE
        .get_or_init(|| {
            let (layer, capture) = TestCaptureLayer::new();
            let _ = tracing_subscriber::registry().with(layer).try_init();
            capture
        })
        .clone()
}
