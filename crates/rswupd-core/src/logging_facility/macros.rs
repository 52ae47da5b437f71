//! Operation-lifecycle logging macros
//!
//! The engine brackets each pipeline operation with a start event and a
//! matching end or end-error event. All three forms share one field
//! schema (component, op, event, plus whatever the call site adds), so
//! they delegate to a single hidden emitter rather than each spelling
//! the field list out; the schema cannot drift between them.
//!
//! `log_op_start!("update")` and
//! `log_op_end!("update", duration_ms = 42, changed = 3)` are the usual
//! shapes; `log_op_error!` additionally records the error kind and its
//! stable code.

/// Shared emitter behind the lifecycle macros. Not public API.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_op_event {
    (info, $event:expr, $op:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $event
            $(, $($field)*)?
        );
    };
    (error, $event:expr, $op:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $event
            $(, $($field)*)?
        );
    };
}

/// Log the start of an operation.
///
/// ```
/// # use rswupd_core::log_op_start;
/// log_op_start!("update");
/// log_op_start!("fetch_manifest", bundle = "os-core");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(info, $crate::schema::EVENT_START, $op $(, $($field)*)?)
    };
}

/// Log the successful end of an operation. `duration_ms` is mandatory;
/// an end event without timing is not useful.
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__log_op_event!(
            info,
            $crate::schema::EVENT_END,
            $op,
            duration_ms = $duration
            $(, $($field)*)?
        )
    };
}

/// Log an operation error, recording the error's kind and stable code
/// alongside the duration.
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let upd_err: &$crate::errors::UpdError = &$err;
        $crate::__log_op_event!(
            error,
            $crate::schema::EVENT_END_ERROR,
            $op,
            duration_ms = $duration,
            err_kind = ?upd_err.kind(),
            err_code = upd_err.code()
            $(, $($field)*)?
        )
    }};
}
