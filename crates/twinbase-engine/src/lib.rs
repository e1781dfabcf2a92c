//! twinbase engine - service layer over bound twin models
//!
//! Wraps a submodel or a shell behind a lock, brackets every operation
//! with canonical start/end log events, and routes operation invocations
//! through the invocation engine.

pub mod services;
pub mod settings;

pub use services::{ShellService, SubmodelService};
pub use settings::EngineSettings;
