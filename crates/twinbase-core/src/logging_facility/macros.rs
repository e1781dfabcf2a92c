//! Operation bracketing macros
//!
//! A service call logs one `start` and then exactly one `end` or
//! `end_error`. Extra fields (`path`, `correlation_id`, `state`, ...) follow
//! the fixed ones in plain `tracing` syntax.

/// `start` event of `op`
///
/// ```
/// # use twinbase_core::log_op_start;
/// log_op_start!("create_element");
/// log_op_start!("invoke_operation", path = "Machine.Calculate", mode = "async");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)+)?) => {
        ::tracing::info!(
            component = module_path!(),
            op = $op,
            event = ::twinbase_core_types::schema::EVENT_START
            $(, $($field)+)?
        )
    };
}

/// `end` event of `op`; the elapsed time is mandatory
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {
        ::tracing::info!(
            component = module_path!(),
            op = $op,
            event = ::twinbase_core_types::schema::EVENT_END,
            duration_ms = $duration
            $(, $($field)+)?
        )
    };
}

/// `end_error` event of `op`
///
/// `$err` is anything convertible into [`ExError`](crate::errors::ExError);
/// its kind and stable code are logged as `err.kind` and `err.code`.
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        ::tracing::error!(
            component = module_path!(),
            op = $op,
            event = ::twinbase_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code()
            $(, $($field)+)?
        )
    }};
}
