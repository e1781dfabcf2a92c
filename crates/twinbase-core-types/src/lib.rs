//! Core types shared across twinbase facilities
//!
//! This crate provides foundational types used by the tree engine, the
//! invocation engine and the logging facility:
//!
//! - **Correlation types**: CorrelationId, RequestId, TraceId, RequestContext
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{CorrelationId, RequestContext, RequestId, TraceId};
