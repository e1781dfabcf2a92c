//! Service facades
//!
//! Each service owns one identifiable model behind a `parking_lot` lock.
//! Mutations take the write lock for their whole duration, which gives the
//! container the one-writer-at-a-time discipline it relies on.

mod shell;
mod submodel;

pub use shell::ShellService;
pub use submodel::SubmodelService;

use std::time::Instant;
use twinbase_core::pagination::PaginationParams;
use twinbase_core::{log_op_end, log_op_error, log_op_start, Result};

use crate::settings::PaginationSection;

/// Bracket `f` with start and end (or end_error) events
fn logged<T>(op: &'static str, path: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    log_op_start!(op, path = path);
    let start = Instant::now();

    match f() {
        Ok(value) => {
            log_op_end!(
                op,
                duration_ms = start.elapsed().as_millis() as u64,
                path = path
            );
            Ok(value)
        }
        Err(err) => {
            log_op_error!(
                op,
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                path = path
            );
            Err(err)
        }
    }
}

fn page_params(
    pagination: &PaginationSection,
    limit: Option<usize>,
    cursor: Option<&str>,
) -> PaginationParams {
    PaginationParams {
        cursor: cursor.map(str::to_string),
        limit: pagination.limit(limit),
    }
}
