//! twinbase invocation - execution of operation elements
//!
//! Operations run synchronously (the caller awaits a terminal state) or
//! asynchronously (the caller gets an `Initiated` response and polls the
//! result store by correlation id). Every run races the method handler
//! against a deadline and signals cooperative cancellation when it passes.

pub mod engine;
pub mod request;
pub mod store;
pub mod validation;

pub use engine::{InvocationEngine, InvocationSettings, LateCompletion, PreparedInvocation};
pub use request::{ExecutionState, InvocationRequest, InvocationResponse};
pub use store::InvocationResultStore;
